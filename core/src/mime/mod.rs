/*
 * mod.rs
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

//! Header and body plumbing for fetched messages: header block splitting,
//! RFC 2047 encoded-words, addresses, dates, multipart text/html extraction.

mod address;
mod body;
mod date;
mod headers;
mod quoted_printable;
mod rfc2047;

pub use address::{parse_address, parse_address_list, Address};
pub use body::{extract_body, AttachmentInfo, ExtractedBody};
pub use date::parse_date;
pub use headers::{bytes_to_text, header_value, parse_headers, split_message};
pub use quoted_printable::decode as decode_quoted_printable;
pub use rfc2047::decode_encoded_words;
