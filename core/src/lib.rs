/*
 * lib.rs
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

//! Mailbridge core: a minimal IMAP4rev1 client engine over implicit TLS.
//!
//! The engine speaks the protocol directly on the byte stream: connect and
//! read the greeting, LOGIN, LIST/SELECT/FETCH/STATUS with tagged command
//! correlation, and decode envelopes and MIME-encoded header fields into
//! plain data structures. One [`protocol::imap::ImapSession`] per caller;
//! no caching, no storage, no business logic.

pub mod config;
pub mod mime;
pub mod net;
pub mod protocol;

pub use config::SessionConfig;
pub use protocol::imap::{connect, ImapError, ImapSession, MessagePage};
