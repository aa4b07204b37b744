/*
 * error.rs
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

//! IMAP engine errors. Connect/Transport/Timeout/Auth/Command errors leave
//! the connection unusable; Parse is raised only when the stream position is
//! lost (per-field problems degrade to defaults instead).

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum ImapError {
    /// DNS, TCP, or TLS failure while establishing the connection, or a
    /// greeting that is not `* OK` / `* PREAUTH`.
    Connect(String),
    /// TLS handshake + greeting did not complete within the connect deadline.
    ConnectTimeout,
    /// A tagged exchange exceeded the command deadline.
    CommandTimeout,
    /// Socket failure mid-session (read/write error, connection closed).
    Transport(String),
    /// LOGIN rejected; carries the server's tagged NO/BAD line verbatim.
    Auth(String),
    /// Any other command rejected with NO or BAD; carries the server line.
    Command(String),
    /// Response violated the expected grammar in a way that loses the stream
    /// position (malformed or truncated literal).
    Parse(String),
    /// UID FETCH returned no record for the requested UID.
    NotFound(u32),
    /// Operation on a session already invalidated by an earlier failure.
    Closed,
}

impl fmt::Display for ImapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImapError::Connect(m) => write!(f, "connect failed: {}", m),
            ImapError::ConnectTimeout => write!(f, "timed out waiting for server greeting"),
            ImapError::CommandTimeout => write!(f, "timed out waiting for command completion"),
            ImapError::Transport(m) => write!(f, "connection failed: {}", m),
            ImapError::Auth(m) => write!(f, "authentication rejected: {}", m),
            ImapError::Command(m) => write!(f, "command rejected: {}", m),
            ImapError::Parse(m) => write!(f, "protocol parse error: {}", m),
            ImapError::NotFound(uid) => write!(f, "no message with uid {}", uid),
            ImapError::Closed => write!(f, "session is closed"),
        }
    }
}

impl std::error::Error for ImapError {}

impl From<io::Error> for ImapError {
    fn from(e: io::Error) -> Self {
        ImapError::Transport(e.to_string())
    }
}
