/*
 * rfc2047.rs
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

//! RFC 2047 encoded-word decoding (=?charset?Q|B?payload?=) for header
//! values. Q: underscore is space, then =XX hex escapes. B: base64.
//! Malformed encoded words pass through unchanged.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::mime::quoted_printable;

/// Expand every well-formed encoded-word in `s`; everything else is copied
/// verbatim.
pub fn decode_encoded_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("=?") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match decode_one(candidate) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &candidate[consumed..];
            }
            None => {
                out.push_str("=?");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one encoded-word at the start of `s` (which begins with "=?").
/// Returns the decoded text and the byte length consumed, or None if the
/// syntax is not a valid encoded-word.
fn decode_one(s: &str) -> Option<(String, usize)> {
    let inner = &s[2..];
    let q1 = inner.find('?')?;
    let charset = &inner[..q1];
    if charset.is_empty() || charset.contains(' ') {
        return None;
    }
    let after_charset = &inner[q1 + 1..];
    let mut enc_chars = after_charset.chars();
    let encoding = enc_chars.next()?;
    if !encoding.is_ascii() || enc_chars.next() != Some('?') {
        return None;
    }
    let payload_area = &after_charset[2..];
    let end = payload_area.find("?=")?;
    let payload = &payload_area[..end];
    let consumed = 2 + q1 + 1 + 2 + end + 2;

    let bytes = match encoding {
        'q' | 'Q' => {
            let spaced: Vec<u8> = payload
                .bytes()
                .map(|b| if b == b'_' { b' ' } else { b })
                .collect();
            quoted_printable::decode(&spaced)
        }
        'b' | 'B' => BASE64.decode(payload).ok()?,
        _ => return None,
    };
    Some((charset_to_text(&bytes, charset), consumed))
}

/// Reinterpret decoded payload bytes in the declared charset. UTF-8 and
/// Latin-1 cover what the target providers emit; anything else falls back
/// to lossy UTF-8.
fn charset_to_text(bytes: &[u8], charset: &str) -> String {
    let cs = charset.to_ascii_lowercase();
    match cs.as_str() {
        "utf-8" | "utf8" | "us-ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "iso_8859-1" | "latin1" | "windows-1252" => {
            bytes.iter().map(|&b| b as char).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test-local Q encoder for round-trip checks.
    fn encode_q(s: &str) -> String {
        let mut payload = String::new();
        for &b in s.as_bytes() {
            match b {
                b' ' => payload.push('_'),
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => payload.push(b as char),
                _ => payload.push_str(&format!("={:02X}", b)),
            }
        }
        format!("=?UTF-8?Q?{}?=", payload)
    }

    fn encode_b(s: &str) -> String {
        format!("=?UTF-8?B?{}?=", BASE64.encode(s.as_bytes()))
    }

    #[test]
    fn decodes_q_underscore_and_hex() {
        assert_eq!(
            decode_encoded_words("=?UTF-8?Q?Umzug_n=C3=A4chste_Woche?="),
            "Umzug n\u{e4}chste Woche"
        );
    }

    #[test]
    fn decodes_b() {
        assert_eq!(decode_encoded_words("=?UTF-8?B?SGFsbG8gV2VsdA==?="), "Hallo Welt");
    }

    #[test]
    fn decodes_latin1_charset() {
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?Entw=FCrfe?="), "Entw\u{fc}rfe");
    }

    #[test]
    fn mixed_literal_and_encoded() {
        assert_eq!(
            decode_encoded_words("Re: =?UTF-8?B?QW5nZWJvdA==?= 2024"),
            "Re: Angebot 2024"
        );
    }

    #[test]
    fn malformed_passes_through() {
        assert_eq!(decode_encoded_words("=?UTF-8?X?abc?="), "=?UTF-8?X?abc?=");
        assert_eq!(decode_encoded_words("price =? 100"), "price =? 100");
        assert_eq!(decode_encoded_words("=?UTF-8?Q?unterminated"), "=?UTF-8?Q?unterminated");
    }

    #[test]
    fn round_trips_q_and_b() {
        for input in ["plain ascii", "Stra\u{df}e 12, M\u{fc}nchen", "K\u{f6}ln \u{2013} Bonn"] {
            assert_eq!(decode_encoded_words(&encode_q(input)), input);
            assert_eq!(decode_encoded_words(&encode_b(input)), input);
        }
    }

    #[test]
    fn decoding_twice_is_stable_for_plain_text() {
        let once = decode_encoded_words("=?UTF-8?Q?Hallo_Welt?=");
        assert_eq!(decode_encoded_words(&once), once);
    }
}
