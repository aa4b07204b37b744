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

//! IMAP session façade: connect + LOGIN, list folders, page through
//! messages newest-first, read one message by UID, LOGOUT.
//!
//! One session per connection, one caller per session. States run
//! Disconnected, Connected (greeting), Authenticated (LOGIN), FolderSelected;
//! SELECT re-enters FolderSelected on every folder-bound operation, and any
//! command failure invalidates the whole session. Callers reconnect rather
//! than retry on a stream whose position is unknown. Concurrent pages mean
//! concurrent sessions.

mod client;
mod error;
mod folders;
mod messages;
mod paging;
mod response;

pub use client::{CommandOutcome, ImapConnection, Status};
pub use error::ImapError;
pub use folders::{classify_special_use, MailboxDescriptor, SpecialUse};
pub use messages::{MessageBody, MessageSummary};
pub use paging::{compute_window, PageWindow};
pub use response::{
    parse_exists, parse_fetch, parse_list_response, parse_status, Envelope, EnvelopeAddress,
    FetchRecord, Item, ListLine, StatusCounts,
};

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::net::{self, TlsStreamWrapper};

/// One page of message summaries, newest first, plus the mailbox total.
#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub messages: Vec<MessageSummary>,
    pub total: u32,
    pub page: u32,
    pub limit: u32,
}

/// Message and unseen counts for one mailbox (STATUS).
pub type FolderStatus = StatusCounts;

/// An authenticated IMAP session over one exclusively-owned connection.
#[derive(Debug)]
pub struct ImapSession<S> {
    conn: ImapConnection<S>,
}

/// Open a TLS connection per `config`, await the greeting, and LOGIN.
/// The connect deadline bounds TCP + TLS + greeting; LOGIN runs under the
/// command deadline like every other exchange.
pub async fn connect(config: &SessionConfig) -> Result<ImapSession<TlsStreamWrapper>, ImapError> {
    let stream = timeout(
        config.connect_timeout(),
        net::connect_implicit_tls(&config.host, config.port, config.accept_invalid_certs),
    )
    .await
    .map_err(|_| ImapError::ConnectTimeout)?
    .map_err(|e| ImapError::Connect(e.to_string()))?;
    debug!(host = %config.host, port = config.port, "TLS connection established");
    ImapSession::attach(stream, config).await
}

impl<S: AsyncRead + AsyncWrite + Unpin> ImapSession<S> {
    /// Run the greeting + LOGIN handshake on an already-established stream.
    pub async fn attach(stream: S, config: &SessionConfig) -> Result<Self, ImapError> {
        let mut conn = ImapConnection::new(stream, config.command_timeout());
        let greeting_deadline = Instant::now() + config.connect_timeout();
        let greeting = conn.read_greeting(greeting_deadline).await?;
        debug!(greeting = %greeting, "greeting received");
        let mut session = Self { conn };
        session.login(&config.user, &config.password).await?;
        debug!(user = %config.user, "authenticated");
        Ok(session)
    }

    async fn login(&mut self, user: &str, password: &str) -> Result<(), ImapError> {
        let cmd = format!("LOGIN {} {}", quote_string(user), quote_string(password));
        match self.conn.send_command(&cmd).await {
            Ok(_) => Ok(()),
            // The rejected command is LOGIN, so a NO/BAD here is an
            // authentication failure; keep the server's wording.
            Err(ImapError::Command(text)) => Err(ImapError::Auth(text)),
            Err(e) => Err(e),
        }
    }

    /// LIST "" "*" and classify every mailbox. Built fresh on every call,
    /// never cached.
    pub async fn list_folders(&mut self) -> Result<Vec<MailboxDescriptor>, ImapError> {
        let outcome = self.conn.send_command(r#"LIST "" "*""#).await?;
        let mut out = Vec::new();
        for unit in &outcome.untagged {
            if let Some(line) = parse_list_response(unit) {
                out.push(folders::descriptor_from_list(&line));
            }
        }
        debug!(folders = out.len(), "mailbox list parsed");
        Ok(out)
    }

    /// STATUS for one mailbox: total and unseen counts. Separate from
    /// `list_folders` so callers hydrate counts only where displayed.
    pub async fn folder_status(&mut self, mailbox: &str) -> Result<FolderStatus, ImapError> {
        let cmd = format!("STATUS {} (MESSAGES UNSEEN)", quote_string(mailbox));
        let outcome = self.conn.send_command(&cmd).await?;
        outcome
            .untagged
            .iter()
            .find_map(|unit| parse_status(unit))
            .ok_or_else(|| ImapError::Parse("STATUS response without counts".into()))
    }

    /// SELECT a mailbox and return its EXISTS count. Absence of an EXISTS
    /// line means an empty mailbox.
    async fn select(&mut self, mailbox: &str) -> Result<u32, ImapError> {
        let cmd = format!("SELECT {}", quote_string(mailbox));
        let outcome = self.conn.send_command(&cmd).await?;
        let exists = outcome
            .untagged
            .iter()
            .find_map(|unit| parse_exists(unit))
            .unwrap_or(0);
        Ok(exists)
    }

    /// One page of summaries from `folder`, newest first. Page numbers are
    /// 1-based; a page beyond the mailbox yields an empty page with the
    /// real total.
    pub async fn list_messages(
        &mut self,
        folder: &str,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage, ImapError> {
        let total = self.select(folder).await?;
        let window = compute_window(total, page, limit);
        debug!(
            folder,
            total,
            start = window.start,
            end = window.end,
            "message page window"
        );
        if window.is_empty() {
            return Ok(MessagePage {
                messages: Vec::new(),
                total,
                page: window.page,
                limit,
            });
        }
        let cmd = format!("FETCH {}:{} (UID FLAGS ENVELOPE)", window.start, window.end);
        let outcome = self.conn.send_command(&cmd).await?;
        let mut messages = Vec::new();
        for unit in &outcome.untagged {
            let Some(record) = parse_fetch(unit) else {
                continue;
            };
            match messages::summary_from_record(&record, folder) {
                Some(summary) => messages.push(summary),
                None => warn!(folder, "unparseable message summary skipped"),
            }
        }
        messages.reverse();
        Ok(MessagePage {
            messages,
            total,
            page: window.page,
            limit,
        })
    }

    /// Fetch one message by UID: headers, text/html bodies, attachment
    /// metadata. `mark_seen` fetches with BODY[] (setting \Seen server-side)
    /// instead of BODY.PEEK[].
    pub async fn read_message(
        &mut self,
        folder: &str,
        uid: u32,
        mark_seen: bool,
    ) -> Result<MessageBody, ImapError> {
        self.select(folder).await?;
        let section = if mark_seen { "BODY[]" } else { "BODY.PEEK[]" };
        let cmd = format!("UID FETCH {} (UID FLAGS {})", uid, section);
        let outcome = self.conn.send_command(&cmd).await?;
        for unit in &outcome.untagged {
            let Some(record) = parse_fetch(unit) else {
                continue;
            };
            if record.uid() != Some(uid) {
                continue;
            }
            if let Some(body) = messages::body_from_record(&record, folder) {
                return Ok(body);
            }
        }
        Err(ImapError::NotFound(uid))
    }

    /// Issue LOGOUT and drop the connection. A failing LOGOUT is irrelevant
    /// to the caller; the connection is discarded either way.
    pub async fn logout(mut self) {
        if let Err(e) = self.conn.send_command("LOGOUT").await {
            debug!(error = %e, "LOGOUT failed; dropping connection anyway");
        }
    }
}

/// Quote a string for LOGIN/SELECT/STATUS arguments: backslash-escape `"`
/// and `\`, wrap in double quotes.
pub fn quote_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
