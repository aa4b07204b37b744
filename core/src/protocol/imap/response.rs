/*
 * response.rs
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

//! Structured parsing of untagged response units. A recursive-descent
//! cursor over IMAP's data grammar (atom / quoted-string / literal /
//! parenthesized list / NIL). Quoted strings may contain parentheses and
//! literals may contain anything, so nothing here counts brackets over raw
//! text. Each unit handed in by the reader already holds its literal bytes
//! inline after the `{n}` announcement.

use crate::mime::bytes_to_text;

/// One data item from the response grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Nil,
    Atom(String),
    Quoted(String),
    Literal(Vec<u8>),
    List(Vec<Item>),
}

impl Item {
    /// Text content of an atom, quoted string, or literal. None for NIL and
    /// lists.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Item::Atom(s) | Item::Quoted(s) => Some(s.clone()),
            Item::Literal(b) => Some(bytes_to_text(b)),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<u32> {
        match self {
            Item::Atom(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Item::Literal(b) => Some(b),
            Item::Quoted(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Item]> {
        match self {
            Item::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Item::Nil)
    }
}

/// Byte cursor over one response unit.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Parse the next item. Errors indicate a malformed unit, not a lost
    /// stream position (literal lengths were already honored by the reader).
    pub fn parse_item(&mut self) -> Result<Item, String> {
        self.skip_spaces();
        match self.peek() {
            None => Err("unexpected end of response".into()),
            Some(b'(') => self.parse_list(),
            Some(b'"') => self.parse_quoted(),
            Some(b'{') => self.parse_literal(),
            Some(_) => self.parse_atom(),
        }
    }

    fn parse_list(&mut self) -> Result<Item, String> {
        self.pos += 1; // consume '('
        let mut items = Vec::new();
        loop {
            self.skip_spaces();
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(Item::List(items));
                }
                None => return Err("unterminated list".into()),
                _ => items.push(self.parse_item()?),
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<Item, String> {
        self.pos += 1; // consume '"'
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\r') | Some(b'\n') => return Err("unterminated quoted string".into()),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Item::Quoted(bytes_to_text(&out)));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) => {
                            out.push(c);
                            self.pos += 1;
                        }
                        None => return Err("dangling escape in quoted string".into()),
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_literal(&mut self) -> Result<Item, String> {
        self.pos += 1; // consume '{'
        let start = self.pos;
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        if self.peek() != Some(b'}') || self.pos == start {
            return Err("malformed literal length".into());
        }
        let len: usize = std::str::from_utf8(&self.buf[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or("unparseable literal length")?;
        self.pos += 1; // consume '}'
        if self.buf.get(self.pos) == Some(&b'\r') && self.buf.get(self.pos + 1) == Some(&b'\n') {
            self.pos += 2;
        }
        if self.pos + len > self.buf.len() {
            return Err("literal shorter than announced length".into());
        }
        let data = self.buf[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(Item::Literal(data))
    }

    fn parse_atom(&mut self) -> Result<Item, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'(' | b')' | b'\r' | b'\n' => break,
                // Section specs like BODY[HEADER.FIELDS (FROM TO)] belong to
                // the atom, spaces and parens included.
                b'[' => {
                    while let Some(c2) = self.peek() {
                        self.pos += 1;
                        if c2 == b']' {
                            break;
                        }
                    }
                }
                _ => self.pos += 1,
            }
        }
        if self.pos == start {
            return Err("empty atom".into());
        }
        let text = bytes_to_text(&self.buf[start..self.pos]);
        if text.eq_ignore_ascii_case("NIL") {
            Ok(Item::Nil)
        } else {
            Ok(Item::Atom(text))
        }
    }
}

/// One `* <seq> FETCH (...)` unit: sequence number plus the flat
/// key/value attribute item list.
#[derive(Debug)]
pub struct FetchRecord {
    pub seq: u32,
    items: Vec<Item>,
}

impl FetchRecord {
    /// Value for an attribute key (UID, FLAGS, ENVELOPE, RFC822.SIZE ...).
    /// Attribute lists alternate key and value items.
    pub fn value(&self, key: &str) -> Option<&Item> {
        let mut i = 0;
        while i + 1 < self.items.len() {
            if let Item::Atom(k) = &self.items[i] {
                if k.eq_ignore_ascii_case(key) {
                    return Some(&self.items[i + 1]);
                }
            }
            i += 2;
        }
        None
    }

    pub fn uid(&self) -> Option<u32> {
        self.value("UID").and_then(Item::as_number)
    }

    pub fn flags(&self) -> Vec<String> {
        self.value("FLAGS")
            .and_then(Item::as_list)
            .map(|items| items.iter().filter_map(Item::as_text).collect())
            .unwrap_or_default()
    }

    pub fn envelope(&self) -> Option<Envelope> {
        self.value("ENVELOPE").and_then(parse_envelope)
    }

    /// Bytes of the first BODY[...] section in the record (the fetched
    /// header block or full message).
    pub fn body_section(&self) -> Option<&[u8]> {
        let mut i = 0;
        while i + 1 < self.items.len() {
            if let Item::Atom(k) = &self.items[i] {
                let upper = k.to_ascii_uppercase();
                if upper.starts_with("BODY[") || upper.starts_with("BODY.PEEK[") {
                    return self.items[i + 1].as_bytes();
                }
            }
            i += 2;
        }
        None
    }
}

/// Parse a `* <seq> FETCH (...)` unit. None when the unit is not a FETCH
/// response or its attribute list is malformed.
pub fn parse_fetch(unit: &[u8]) -> Option<FetchRecord> {
    let mut cur = Cursor::new(unit);
    if cur.peek() != Some(b'*') {
        return None;
    }
    cur.pos += 1;
    let seq = cur.parse_item().ok()?.as_number()?;
    let keyword = cur.parse_item().ok()?;
    if keyword.as_text()?.eq_ignore_ascii_case("FETCH") {
        let items = match cur.parse_item().ok()? {
            Item::List(items) => items,
            _ => return None,
        };
        return Some(FetchRecord { seq, items });
    }
    None
}

/// One `* LIST (flags) delimiter name` line.
#[derive(Debug, Clone)]
pub struct ListLine {
    pub flags: Vec<String>,
    pub delimiter: Option<char>,
    pub name: String,
}

/// Parse a `* LIST ...` unit. None for any other untagged response.
pub fn parse_list_response(unit: &[u8]) -> Option<ListLine> {
    let mut cur = Cursor::new(unit);
    if cur.peek() != Some(b'*') {
        return None;
    }
    cur.pos += 1;
    let keyword = cur.parse_item().ok()?.as_text()?;
    if !keyword.eq_ignore_ascii_case("LIST") {
        return None;
    }
    let flags = cur
        .parse_item()
        .ok()?
        .as_list()?
        .iter()
        .filter_map(Item::as_text)
        .collect();
    let delimiter = match cur.parse_item().ok()? {
        Item::Nil => None,
        item => item.as_text().and_then(|s| s.chars().next()),
    };
    let name = cur.parse_item().ok()?.as_text()?;
    Some(ListLine {
        flags,
        delimiter,
        name,
    })
}

/// Extract the count from a `* <n> EXISTS` unit.
pub fn parse_exists(unit: &[u8]) -> Option<u32> {
    let text = bytes_to_text(unit);
    let mut words = text.split_whitespace();
    if words.next() != Some("*") {
        return None;
    }
    let n: u32 = words.next()?.parse().ok()?;
    if words.next()?.eq_ignore_ascii_case("EXISTS") {
        Some(n)
    } else {
        None
    }
}

/// Counts from a `* STATUS <name> (MESSAGES n UNSEEN m)` unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusCounts {
    pub messages: u32,
    pub unseen: u32,
}

pub fn parse_status(unit: &[u8]) -> Option<StatusCounts> {
    let mut cur = Cursor::new(unit);
    if cur.peek() != Some(b'*') {
        return None;
    }
    cur.pos += 1;
    if !cur.parse_item().ok()?.as_text()?.eq_ignore_ascii_case("STATUS") {
        return None;
    }
    let _name = cur.parse_item().ok()?;
    let items = match cur.parse_item().ok()? {
        Item::List(items) => items,
        _ => return None,
    };
    let mut counts = StatusCounts::default();
    let mut i = 0;
    while i + 1 < items.len() {
        if let (Some(key), Some(n)) = (items[i].as_text(), items[i + 1].as_number()) {
            match key.to_ascii_uppercase().as_str() {
                "MESSAGES" => counts.messages = n,
                "UNSEEN" => counts.unseen = n,
                _ => {}
            }
        }
        i += 2;
    }
    Some(counts)
}

/// Structured ENVELOPE: (date subject from sender reply-to to cc bcc
/// in-reply-to message-id); address fields are lists of (name adl mailbox
/// host) quadruples or NIL.
#[derive(Debug, Default, Clone)]
pub struct Envelope {
    pub date: Option<String>,
    pub subject: Option<String>,
    pub from: Vec<EnvelopeAddress>,
    pub to: Vec<EnvelopeAddress>,
    pub cc: Vec<EnvelopeAddress>,
    pub message_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnvelopeAddress {
    pub name: Option<String>,
    pub mailbox: Option<String>,
    pub host: Option<String>,
}

impl EnvelopeAddress {
    /// `mailbox@host`, when both halves are present.
    pub fn addr_spec(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{}@{}", m, h)),
            _ => None,
        }
    }
}

/// Decode an ENVELOPE item. None when the item is not the expected
/// ten-element list.
pub fn parse_envelope(item: &Item) -> Option<Envelope> {
    let fields = item.as_list()?;
    if fields.len() < 10 {
        return None;
    }
    Some(Envelope {
        date: fields[0].as_text(),
        subject: fields[1].as_text(),
        from: parse_address_field(&fields[2]),
        to: parse_address_field(&fields[5]),
        cc: parse_address_field(&fields[6]),
        message_id: fields[9].as_text(),
    })
}

fn parse_address_field(item: &Item) -> Vec<EnvelopeAddress> {
    let Some(groups) = item.as_list() else {
        return Vec::new();
    };
    groups
        .iter()
        .filter_map(|g| {
            let quad = g.as_list()?;
            if quad.len() < 4 {
                return None;
            }
            Some(EnvelopeAddress {
                name: quad[0].as_text(),
                mailbox: quad[2].as_text(),
                host: quad[3].as_text(),
            })
        })
        .collect()
}
