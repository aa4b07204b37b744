/*
 * date.rs
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

//! RFC 2822 date-time parsing for Date headers and ENVELOPE date fields.
//! Unparseable input is `None`; the engine never substitutes the current
//! time for an unknown date.

use chrono::{DateTime, FixedOffset};

/// Parse an RFC 2822 date like "Fri, 21 Nov 1997 09:55:06 -0600".
/// Tolerates a trailing comment zone ("(CEST)") and a missing seconds field.
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = strip_zone_comment(value.trim());
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&value) {
        return Some(dt);
    }
    // Without day-of-week and/or seconds; rfc2822 parsing already covers the
    // standard permutations, these catch what providers actually emit.
    let no_weekday = value
        .split_once(',')
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_else(|| value.clone());
    for fmt in ["%d %b %Y %H:%M:%S %z", "%d %b %Y %H:%M %z"] {
        if let Ok(dt) = DateTime::parse_from_str(&no_weekday, fmt) {
            return Some(dt);
        }
    }
    None
}

/// Drop a trailing "(...)" comment, e.g. "+0200 (CEST)".
fn strip_zone_comment(value: &str) -> String {
    match value.rfind('(') {
        Some(open) if value[open..].contains(')') => value[..open].trim_end().to_string(),
        _ => value.to_string(),
    }
}
