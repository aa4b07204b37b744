/*
 * address.rs
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

//! Mailbox address parsing for From/To header values: `Display <a@b>`,
//! `"Quoted, Name" <a@b>`, bare `a@b`. Not a full RFC 5322 address-list
//! grammar; groups and route syntax do not occur in the traffic this engine
//! handles.

use serde::Serialize;

/// One mailbox: display name (may be empty) and addr-spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub name: String,
    pub address: String,
}

/// Parse a single mailbox. A bare address yields `name = ""`.
pub fn parse_address(value: &str) -> Address {
    let value = value.trim();
    if let Some(open) = value.rfind('<') {
        let close = value[open..].find('>').map(|i| open + i).unwrap_or(value.len());
        let address = value[open + 1..close].trim().to_string();
        let name = unquote(value[..open].trim());
        return Address { name, address };
    }
    Address {
        name: String::new(),
        address: value.to_string(),
    }
}

/// Split a header value on commas outside quotes and angle brackets, then
/// parse each mailbox. Empty segments are dropped.
pub fn parse_address_list(value: &str) -> Vec<Address> {
    let mut out = Vec::new();
    let mut depth_angle = 0u32;
    let mut in_quote = false;
    let mut start = 0;
    let bytes = value.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quote = !in_quote,
            b'<' if !in_quote => depth_angle += 1,
            b'>' if !in_quote => depth_angle = depth_angle.saturating_sub(1),
            b',' if !in_quote && depth_angle == 0 => {
                let seg = value[start..i].trim();
                if !seg.is_empty() {
                    out.push(parse_address(seg));
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let seg = value[start..].trim();
    if !seg.is_empty() {
        out.push(parse_address(seg));
    }
    out
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_has_empty_name() {
        let a = parse_address("info@firma.de");
        assert_eq!(a.name, "");
        assert_eq!(a.address, "info@firma.de");
    }

    #[test]
    fn display_name_and_angle_addr() {
        let a = parse_address("Anna Schmidt <anna@example.de>");
        assert_eq!(a.name, "Anna Schmidt");
        assert_eq!(a.address, "anna@example.de");
    }

    #[test]
    fn quoted_display_name_with_comma() {
        let a = parse_address("\"Schmidt, Anna\" <anna@example.de>");
        assert_eq!(a.name, "Schmidt, Anna");
        assert_eq!(a.address, "anna@example.de");
    }

    #[test]
    fn list_splits_outside_quotes() {
        let list = parse_address_list("\"M\u{fc}ller, Jan\" <jan@a.de>, info@b.de");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "M\u{fc}ller, Jan");
        assert_eq!(list[1].address, "info@b.de");
    }

    #[test]
    fn empty_value_yields_no_addresses() {
        assert!(parse_address_list("  ").is_empty());
    }
}
