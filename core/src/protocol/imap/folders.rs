/*
 * folders.rs
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

//! Mailbox catalog: LIST lines become flat descriptors with
//! delimiter-derived hierarchy and special-use classification. Attribute
//! flags win over the bilingual name table, so servers that advertise
//! `\Sent` on a folder named "Archiv" still classify correctly.

use std::collections::HashSet;

use serde::Serialize;

use crate::protocol::imap::response::ListLine;

/// Conventional folder role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialUse {
    Inbox,
    Sent,
    Drafts,
    Trash,
    Spam,
}

/// One mailbox from a LIST response. `path` is the full server-side name,
/// `name` the last hierarchy segment; children appear as their own
/// descriptors in the same flat list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxDescriptor {
    pub name: String,
    pub path: String,
    pub delimiter: Option<char>,
    pub flags: HashSet<String>,
    pub level: u32,
    pub has_children: bool,
    pub special_use: Option<SpecialUse>,
    pub unread_count: u32,
    pub total_count: u32,
}

impl MailboxDescriptor {
    /// The delimiter-derived parent path; None at the hierarchy root.
    pub fn parent_path(&self) -> Option<&str> {
        let delim = self.delimiter?;
        self.path.rfind(delim).map(|i| &self.path[..i])
    }
}

/// Build a descriptor from a parsed LIST line. Hierarchy level counts
/// delimiter occurrences in the path; a NIL delimiter means a flat listing
/// and level 0.
pub fn descriptor_from_list(line: &ListLine) -> MailboxDescriptor {
    let path = line.name.trim_matches('"').to_string();
    let (name, level) = match line.delimiter {
        Some(delim) => {
            let level = path.matches(delim).count() as u32;
            let name = path
                .rsplit(delim)
                .next()
                .unwrap_or(path.as_str())
                .to_string();
            (name, level)
        }
        None => (path.clone(), 0),
    };
    let flags: HashSet<String> = line.flags.iter().cloned().collect();
    let has_children = !flags
        .iter()
        .any(|f| f.eq_ignore_ascii_case("\\HasNoChildren"));
    let special_use = classify_special_use(&flags, &name);
    MailboxDescriptor {
        name,
        path,
        delimiter: line.delimiter,
        flags,
        level,
        has_children,
        special_use,
        unread_count: 0,
        total_count: 0,
    }
}

/// Special-use resolution: attribute flags first, then the name table.
/// The table covers the English and German folder names the target
/// providers use.
pub fn classify_special_use(flags: &HashSet<String>, name: &str) -> Option<SpecialUse> {
    for flag in flags {
        let special = match flag.to_ascii_lowercase().as_str() {
            "\\inbox" => Some(SpecialUse::Inbox),
            "\\sent" => Some(SpecialUse::Sent),
            "\\drafts" => Some(SpecialUse::Drafts),
            "\\trash" => Some(SpecialUse::Trash),
            "\\junk" | "\\spam" => Some(SpecialUse::Spam),
            _ => None,
        };
        if special.is_some() {
            return special;
        }
    }
    match name.to_lowercase().as_str() {
        "inbox" => Some(SpecialUse::Inbox),
        "sent" | "gesendet" => Some(SpecialUse::Sent),
        "drafts" | "entw\u{fc}rfe" => Some(SpecialUse::Drafts),
        "trash" | "papierkorb" => Some(SpecialUse::Trash),
        "spam" | "junk" => Some(SpecialUse::Spam),
        _ => None,
    }
}
