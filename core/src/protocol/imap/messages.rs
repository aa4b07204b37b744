/*
 * messages.rs
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

//! FETCH records become message summaries and bodies. Missing or
//! malformed fields degrade to defaults; one broken message must not
//! prevent listing the rest of a mailbox. Only a record without a UID is
//! dropped entirely.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::warn;

use crate::mime;
use crate::mime::{Address, AttachmentInfo};
use crate::protocol::imap::response::{Envelope, EnvelopeAddress, FetchRecord};

const NO_SUBJECT: &str = "(No subject)";

/// Summary of one message for list views.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    pub uid: u32,
    pub sequence: u32,
    pub flags: HashSet<String>,
    pub from: Option<Address>,
    pub to: Vec<Address>,
    pub subject: String,
    /// None when the message carries no parseable date; never substituted
    /// with the current time.
    pub date: Option<DateTime<FixedOffset>>,
    pub folder: String,
    pub preview: String,
}

/// A fully fetched message: summary fields plus decoded content.
#[derive(Debug, Clone, Serialize)]
pub struct MessageBody {
    pub uid: u32,
    pub sequence: u32,
    pub flags: HashSet<String>,
    pub from: Option<Address>,
    pub to: Vec<Address>,
    pub subject: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub folder: String,
    pub preview: String,
    pub text: String,
    pub html: Option<String>,
    pub attachments: Vec<AttachmentInfo>,
}

/// Decode a `FETCH (UID FLAGS ENVELOPE)` record. None when the record has
/// no UID, which makes it unaddressable for the caller.
pub fn summary_from_record(record: &FetchRecord, folder: &str) -> Option<MessageSummary> {
    let Some(uid) = record.uid() else {
        warn!(seq = record.seq, "fetch record without UID skipped");
        return None;
    };
    let envelope = record.envelope().unwrap_or_else(|| {
        warn!(seq = record.seq, "fetch record without parseable ENVELOPE");
        Envelope::default()
    });
    let subject = decode_subject(envelope.subject.as_deref());
    let date = envelope.date.as_deref().and_then(mime::parse_date);
    Some(MessageSummary {
        uid,
        sequence: record.seq,
        flags: record.flags().into_iter().collect(),
        from: envelope.from.first().and_then(address_from_envelope),
        to: envelope.to.iter().filter_map(address_from_envelope).collect(),
        subject: subject.clone(),
        date,
        folder: folder.to_string(),
        preview: subject,
    })
}

/// Decode a `UID FETCH <uid> (UID FLAGS BODY[])` record into the full
/// message: headers parsed for the summary fields, body walked for
/// text/html/attachments.
pub fn body_from_record(record: &FetchRecord, folder: &str) -> Option<MessageBody> {
    let uid = record.uid()?;
    let raw = record.body_section()?;
    let (head, body) = mime::split_message(raw);
    let headers = mime::parse_headers(head);

    let subject = decode_subject(mime::header_value(&headers, "Subject"));
    let date = mime::header_value(&headers, "Date").and_then(mime::parse_date);
    let from = mime::header_value(&headers, "From")
        .map(|v| mime::parse_address(&mime::decode_encoded_words(v)));
    let to = mime::header_value(&headers, "To")
        .map(|v| mime::parse_address_list(&mime::decode_encoded_words(v)))
        .unwrap_or_default();

    let extracted = mime::extract_body(&headers, body);
    let text = match (extracted.text, &extracted.html) {
        (Some(t), _) => t,
        (None, Some(html)) => strip_tags(html),
        (None, None) => String::new(),
    };

    Some(MessageBody {
        uid,
        sequence: record.seq,
        flags: record.flags().into_iter().collect(),
        from,
        to,
        subject: subject.clone(),
        date,
        folder: folder.to_string(),
        preview: subject,
        text,
        html: extracted.html,
        attachments: extracted.attachments,
    })
}

fn decode_subject(raw: Option<&str>) -> String {
    match raw {
        Some(s) if !s.trim().is_empty() => mime::decode_encoded_words(s.trim()),
        _ => NO_SUBJECT.to_string(),
    }
}

fn address_from_envelope(addr: &EnvelopeAddress) -> Option<Address> {
    let address = addr.addr_spec()?;
    let name = addr
        .name
        .as_deref()
        .map(mime::decode_encoded_words)
        .unwrap_or_default();
    Some(Address { name, address })
}

/// Crude plain-text rendering of an HTML-only message: drop tags, decode
/// the few entities that matter for readability.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::imap::response::parse_fetch;

    #[test]
    fn summary_decodes_envelope_fields() {
        let unit = b"* 4 FETCH (UID 88 FLAGS (\\Seen) ENVELOPE (\"Mon, 7 Jul 2025 09:15:00 +0200\" \"=?UTF-8?Q?Umzugsangebot_f=C3=BCr_Juli?=\" ((\"Anna Schmidt\" NIL \"anna\" \"example.de\")) NIL NIL ((NIL NIL \"info\" \"firma.de\")) NIL NIL NIL \"<a1@example.de>\"))";
        let record = parse_fetch(unit).unwrap();
        let s = summary_from_record(&record, "INBOX").unwrap();
        assert_eq!(s.uid, 88);
        assert_eq!(s.sequence, 4);
        assert!(s.flags.contains("\\Seen"));
        assert_eq!(s.subject, "Umzugsangebot f\u{fc}r Juli");
        assert_eq!(s.preview, s.subject);
        let from = s.from.unwrap();
        assert_eq!(from.name, "Anna Schmidt");
        assert_eq!(from.address, "anna@example.de");
        assert_eq!(s.to[0].address, "info@firma.de");
        assert_eq!(s.to[0].name, "");
        assert!(s.date.is_some());
        assert_eq!(s.folder, "INBOX");
    }

    #[test]
    fn summary_without_uid_is_dropped() {
        let record = parse_fetch(b"* 2 FETCH (FLAGS (\\Seen))").unwrap();
        assert!(summary_from_record(&record, "INBOX").is_none());
    }

    #[test]
    fn summary_defaults_for_missing_envelope_fields() {
        let unit = b"* 1 FETCH (UID 5 FLAGS () ENVELOPE (NIL NIL NIL NIL NIL NIL NIL NIL NIL NIL))";
        let record = parse_fetch(unit).unwrap();
        let s = summary_from_record(&record, "INBOX").unwrap();
        assert_eq!(s.subject, "(No subject)");
        assert!(s.from.is_none());
        assert!(s.to.is_empty());
        assert!(s.date.is_none());
    }

    #[test]
    fn unparseable_date_stays_none() {
        let unit = b"* 1 FETCH (UID 5 ENVELOPE (\"tomorrow-ish\" \"hi\" NIL NIL NIL NIL NIL NIL NIL NIL))";
        let record = parse_fetch(unit).unwrap();
        let s = summary_from_record(&record, "INBOX").unwrap();
        assert!(s.date.is_none());
    }

    #[test]
    fn body_from_full_fetch() {
        let message = b"From: \"Anna Schmidt\" <anna@example.de>\r\n\
To: info@firma.de\r\n\
Subject: =?UTF-8?Q?R=C3=BCckfrage?=\r\n\
Date: Mon, 7 Jul 2025 09:15:00 +0200\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Guten Tag,\r\nwann passt es Ihnen?\r\n";
        let unit = [
            format!("* 3 FETCH (UID 42 FLAGS (\\Seen) BODY[] {{{}}}\r\n", message.len()).into_bytes(),
            message.to_vec(),
            b")".to_vec(),
        ]
        .concat();
        let record = parse_fetch(&unit).unwrap();
        let body = body_from_record(&record, "INBOX").unwrap();
        assert_eq!(body.uid, 42);
        assert_eq!(body.subject, "R\u{fc}ckfrage");
        assert_eq!(body.from.as_ref().unwrap().name, "Anna Schmidt");
        assert!(body.text.contains("wann passt es Ihnen?"));
        assert!(body.html.is_none());
        assert!(body.attachments.is_empty());
    }

    #[test]
    fn html_only_body_gets_text_fallback() {
        let message = b"Subject: x\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Hallo&nbsp;Welt</p>\r\n";
        let unit = [
            format!("* 1 FETCH (UID 7 BODY[] {{{}}}\r\n", message.len()).into_bytes(),
            message.to_vec(),
            b")".to_vec(),
        ]
        .concat();
        let record = parse_fetch(&unit).unwrap();
        let body = body_from_record(&record, "INBOX").unwrap();
        assert_eq!(body.text, "Hallo Welt");
        assert!(body.html.is_some());
    }
}
