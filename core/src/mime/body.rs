/*
 * body.rs
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

//! Body extraction from a fetched message: walk multipart structure, pick
//! the first text/plain and text/html parts (quoted-printable and base64
//! transfer decoding), and record attachment metadata. Attachment content
//! is never decoded, only described.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

use crate::mime::headers::{bytes_to_text, header_value, parse_headers, split_message};
use crate::mime::quoted_printable;

const MAX_NESTING: u32 = 8;

/// Attachment descriptor: filename, size of the (undecoded) content in
/// bytes, declared media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    pub filename: String,
    pub size: u64,
    pub content_type: String,
}

/// Extraction result. `text`/`html` are the first matching parts found in
/// document order; either may be absent.
#[derive(Debug, Default)]
pub struct ExtractedBody {
    pub text: Option<String>,
    pub html: Option<String>,
    pub attachments: Vec<AttachmentInfo>,
}

/// Extract text/html/attachments from a message given its already-split
/// top-level headers and body bytes.
pub fn extract_body(headers: &[(String, String)], body: &[u8]) -> ExtractedBody {
    let mut out = ExtractedBody::default();
    walk(headers, body, 0, &mut out);
    out
}

fn walk(headers: &[(String, String)], body: &[u8], depth: u32, out: &mut ExtractedBody) {
    if depth > MAX_NESTING {
        return;
    }
    let ct = header_value(headers, "Content-Type").unwrap_or("text/plain");
    let (media_type, params) = parse_params(ct);

    if media_type.starts_with("multipart/") {
        let Some(boundary) = param(&params, "boundary") else {
            // Multipart without a boundary cannot be split; show it raw.
            out.text.get_or_insert_with(|| bytes_to_text(body).trim().to_string());
            return;
        };
        for part in split_parts(body, boundary) {
            let (head, part_body) = split_message(&part);
            let part_headers = parse_headers(head);
            walk(&part_headers, part_body, depth + 1, out);
        }
        return;
    }

    let disposition = header_value(headers, "Content-Disposition").unwrap_or("");
    let (disp_type, disp_params) = parse_params(disposition);
    let filename = param(&disp_params, "filename")
        .or_else(|| param(&params, "name"))
        .map(|s| s.to_string());

    if disp_type == "attachment" || filename.is_some() {
        out.attachments.push(AttachmentInfo {
            filename: filename.unwrap_or_default(),
            size: content_size(headers, body),
            content_type: media_type,
        });
        return;
    }

    if media_type == "text/html" {
        if out.html.is_none() {
            out.html = Some(decode_text_part(headers, body));
        }
    } else if media_type.starts_with("text/") {
        if out.text.is_none() {
            out.text = Some(decode_text_part(headers, body));
        }
    }
}

/// Transfer-decode a text part and convert to a trimmed string.
fn decode_text_part(headers: &[(String, String)], body: &[u8]) -> String {
    let encoding = header_value(headers, "Content-Transfer-Encoding")
        .unwrap_or("7bit")
        .trim()
        .to_ascii_lowercase();
    let decoded = match encoding.as_str() {
        "base64" => {
            let compact: Vec<u8> = body.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
            BASE64.decode(&compact).unwrap_or_else(|_| body.to_vec())
        }
        "quoted-printable" => quoted_printable::decode(body),
        _ => body.to_vec(),
    };
    bytes_to_text(&decoded).trim().to_string()
}

/// Size of the part's content in bytes. Base64 bodies report the decoded
/// length (derivable from the character count without decoding).
fn content_size(headers: &[(String, String)], body: &[u8]) -> u64 {
    let encoding = header_value(headers, "Content-Transfer-Encoding")
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if encoding == "base64" {
        let chars = body.iter().filter(|b| !b.is_ascii_whitespace()).count();
        let padding = body
            .iter()
            .rev()
            .filter(|b| !b.is_ascii_whitespace())
            .take_while(|&&b| b == b'=')
            .count()
            .min(2);
        return ((chars / 4) * 3).saturating_sub(padding) as u64;
    }
    body.len() as u64
}

/// Split a multipart body at its "--boundary" delimiter lines. The close
/// delimiter "--boundary--" ends the walk; a missing close delimiter still
/// yields the accumulated parts.
fn split_parts(body: &[u8], boundary: &str) -> Vec<Vec<u8>> {
    let delim = format!("--{}", boundary);
    let close = format!("--{}--", boundary);
    let mut parts: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<Vec<u8>> = None;
    for raw_line in body.split(|&b| b == b'\n') {
        let line = match raw_line.last() {
            Some(b'\r') => &raw_line[..raw_line.len() - 1],
            _ => raw_line,
        };
        if line == close.as_bytes() {
            if let Some(p) = current.take() {
                parts.push(p);
            }
            break;
        }
        if line == delim.as_bytes() {
            if let Some(p) = current.take() {
                parts.push(p);
            }
            current = Some(Vec::new());
            continue;
        }
        if let Some(p) = current.as_mut() {
            p.extend_from_slice(raw_line);
            p.push(b'\n');
        }
    }
    if let Some(p) = current.take() {
        parts.push(p);
    }
    parts
}

/// Split "main; key=value; key2="value"" into the lowercased main token and
/// its parameters.
fn parse_params(value: &str) -> (String, Vec<(String, String)>) {
    let mut segments = value.split(';');
    let main = segments.next().unwrap_or("").trim().to_ascii_lowercase();
    let mut params = Vec::new();
    for seg in segments {
        if let Some((k, v)) = seg.split_once('=') {
            let v = v.trim();
            let v = v.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(v);
            params.push((k.trim().to_ascii_lowercase(), v.to_string()));
        }
    }
    (main, params)
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_of(raw: &[u8]) -> Vec<(String, String)> {
        parse_headers(raw)
    }

    #[test]
    fn plain_message_is_text() {
        let headers = headers_of(b"Content-Type: text/plain; charset=utf-8\r\n");
        let got = extract_body(&headers, b"Sehr geehrte Damen und Herren,\r\n");
        assert_eq!(got.text.as_deref(), Some("Sehr geehrte Damen und Herren,"));
        assert!(got.html.is_none());
        assert!(got.attachments.is_empty());
    }

    #[test]
    fn message_without_content_type_is_text() {
        let got = extract_body(&[], b"hello");
        assert_eq!(got.text.as_deref(), Some("hello"));
    }

    #[test]
    fn multipart_alternative_yields_both() {
        let headers = headers_of(b"Content-Type: multipart/alternative; boundary=\"b1\"\r\n");
        let body = b"--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Gr=C3=BC=C3=9Fe\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
PGI+R3LDvMOfZTwvYj4=\r\n\
--b1--\r\n";
        let got = extract_body(&headers, body);
        assert_eq!(got.text.as_deref(), Some("Gr\u{fc}\u{df}e"));
        assert_eq!(got.html.as_deref(), Some("<b>Gr\u{fc}\u{df}e</b>"));
    }

    #[test]
    fn attachment_metadata_without_content() {
        let headers = headers_of(b"Content-Type: multipart/mixed; boundary=b2\r\n");
        let body = b"--b2\r\n\
Content-Type: text/plain\r\n\
\r\n\
see attachment\r\n\
--b2\r\n\
Content-Type: application/pdf; name=\"angebot.pdf\"\r\n\
Content-Disposition: attachment; filename=\"angebot.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQ=\r\n\
--b2--\r\n";
        let got = extract_body(&headers, body);
        assert_eq!(got.text.as_deref(), Some("see attachment"));
        assert_eq!(got.attachments.len(), 1);
        let att = &got.attachments[0];
        assert_eq!(att.filename, "angebot.pdf");
        assert_eq!(att.content_type, "application/pdf");
        assert_eq!(att.size, 8);
    }

    #[test]
    fn nested_multipart_is_walked() {
        let headers = headers_of(b"Content-Type: multipart/mixed; boundary=outer\r\n");
        let body = b"--outer\r\n\
Content-Type: multipart/alternative; boundary=inner\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain\r\n\
\r\n\
inner text\r\n\
--inner--\r\n\
--outer--\r\n";
        let got = extract_body(&headers, body);
        assert_eq!(got.text.as_deref(), Some("inner text"));
    }
}
