/*
 * headers.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Mailbridge, an email integration engine.
 *
 * Mailbridge is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Mailbridge is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Mailbridge.  If not, see <http://www.gnu.org/licenses/>.
 */

//! RFC 822 header block handling: split a raw message at the first blank
//! line, unfold continuation lines, case-insensitive field lookup.

/// Split raw message bytes into (header block, body) at the first blank line.
/// Accepts CRLF and bare LF separators. A message without a blank line is all
/// headers.
pub fn split_message(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
        return (&raw[..pos], &raw[pos + 4..]);
    }
    if let Some(pos) = raw.windows(2).position(|w| w == b"\n\n") {
        return (&raw[..pos], &raw[pos + 2..]);
    }
    (raw, &[])
}

/// Header value bytes to text: UTF-8 when valid, otherwise byte-per-char
/// (ISO-8859-1), so no input is ever lost to replacement characters.
pub fn bytes_to_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse a header block into unfolded (name, value) pairs in order of
/// appearance. Lines starting with whitespace continue the previous value
/// with a single space. Lines without a colon are skipped.
pub fn parse_headers(block: &[u8]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for raw_line in block.split(|&b| b == b'\n') {
        let line = strip_cr(raw_line);
        if line.is_empty() {
            continue;
        }
        if line[0] == b' ' || line[0] == b'\t' {
            if let Some(last) = out.last_mut() {
                let cont = bytes_to_text(trim_bytes(line));
                if !cont.is_empty() {
                    if !last.1.is_empty() {
                        last.1.push(' ');
                    }
                    last.1.push_str(&cont);
                }
            }
            continue;
        }
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            continue;
        };
        let name = bytes_to_text(trim_bytes(&line[..colon]));
        let value = bytes_to_text(trim_bytes(&line[colon + 1..]));
        out.push((name, value));
    }
    out
}

/// First value for `name`, case-insensitive.
pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn strip_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

fn trim_bytes(mut b: &[u8]) -> &[u8] {
    while let Some((&first, rest)) = b.split_first() {
        if first == b' ' || first == b'\t' {
            b = rest;
        } else {
            break;
        }
    }
    while let Some((&last, rest)) = b.split_last() {
        if last == b' ' || last == b'\t' {
            b = rest;
        } else {
            break;
        }
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_at_blank_line() {
        let raw = b"Subject: hi\r\nFrom: a@b\r\n\r\nbody text";
        let (head, body) = split_message(raw);
        assert_eq!(head, b"Subject: hi\r\nFrom: a@b");
        assert_eq!(body, b"body text");
    }

    #[test]
    fn split_without_body() {
        let raw = b"Subject: hi\r\n";
        let (head, body) = split_message(raw);
        assert_eq!(head, raw.as_slice());
        assert!(body.is_empty());
    }

    #[test]
    fn unfolds_continuation_lines() {
        let block = b"Subject: a very\r\n long subject\r\nTo: x@y\r\n";
        let headers = parse_headers(block);
        assert_eq!(header_value(&headers, "subject"), Some("a very long subject"));
        assert_eq!(header_value(&headers, "To"), Some("x@y"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let headers = parse_headers(b"CONTENT-TYPE: text/plain\r\n");
        assert_eq!(header_value(&headers, "Content-Type"), Some("text/plain"));
    }

    #[test]
    fn latin1_bytes_survive() {
        let headers = parse_headers(b"Subject: Entw\xfcrfe\r\n");
        assert_eq!(header_value(&headers, "Subject"), Some("Entw\u{fc}rfe"));
    }
}
