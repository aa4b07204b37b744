/*
 * client.rs
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

//! Command correlation on one connection: allocate tags (A0001, A0002, ...),
//! write `<tag> <command>\r\n`, collect untagged response units until the
//! tagged `OK|NO|BAD` terminator. One command at a time: tags delimit
//! responses, they do not enable pipelining.
//!
//! The reader is a buffered state machine over `BytesMut`: scan for CRLF
//! from a remembered offset, or consume an announced literal by exact
//! length. A line ending in `{n}` pulls the n raw bytes and the
//! continuation line into the same logical unit, so downstream parsing
//! never has to find message boundaries in raw text.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Duration, Instant};

use crate::protocol::imap::error::ImapError;

/// Upper bound for a single announced literal; anything larger is treated
/// as a protocol violation rather than honored.
const MAX_LITERAL: usize = 32 * 1024 * 1024;

const READ_CHUNK: usize = 4096;

/// Status of a tagged completion line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    No,
    Bad,
}

/// Everything the server sent for one command: the untagged units in
/// arrival order and the final tagged line.
#[derive(Debug)]
pub struct CommandOutcome {
    pub untagged: Vec<Vec<u8>>,
    pub tagged: String,
}

/// One IMAP connection: stream, read buffer, tag counter. Exclusively owned
/// by a single session; poisoned (and unusable) after any timeout or
/// transport failure, because the stream position relative to the server is
/// then unknown.
#[derive(Debug)]
pub struct ImapConnection<S> {
    stream: S,
    buf: BytesMut,
    scanned: usize,
    tag_counter: u32,
    command_timeout: Duration,
    poisoned: bool,
}

impl<S: AsyncRead + AsyncWrite + Unpin> ImapConnection<S> {
    pub fn new(stream: S, command_timeout: Duration) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            tag_counter: 0,
            command_timeout,
            poisoned: false,
        }
    }

    fn next_tag(&mut self) -> String {
        self.tag_counter += 1;
        format!("A{:04}", self.tag_counter)
    }

    fn poison<T>(&mut self, err: ImapError) -> Result<T, ImapError> {
        self.poisoned = true;
        Err(err)
    }

    /// Read the server greeting. `deadline` is the connect deadline; a
    /// missing or non-OK greeting fails the connection attempt.
    pub async fn read_greeting(&mut self, deadline: Instant) -> Result<String, ImapError> {
        let line = match self.read_line(deadline).await {
            Ok(line) => line,
            Err(ImapError::CommandTimeout) => return self.poison(ImapError::ConnectTimeout),
            Err(e) => return self.poison(e),
        };
        let text = String::from_utf8_lossy(&line).into_owned();
        if text.starts_with("* OK") || text.starts_with("* PREAUTH") {
            Ok(text)
        } else {
            self.poison(ImapError::Connect(format!("unexpected greeting: {}", text)))
        }
    }

    /// Issue one command and collect its response. NO/BAD completions are
    /// returned as `ImapError::Command` carrying the server's line; the
    /// connection is unusable afterwards (the session state machine treats
    /// every command failure as fatal).
    pub async fn send_command(&mut self, command: &str) -> Result<CommandOutcome, ImapError> {
        if self.poisoned {
            return Err(ImapError::Closed);
        }
        let tag = self.next_tag();
        let deadline = Instant::now() + self.command_timeout;
        let line = format!("{} {}\r\n", tag, command);
        if let Err(e) = self.write_all(line.as_bytes(), deadline).await {
            return self.poison(e);
        }

        let mut untagged: Vec<Vec<u8>> = Vec::new();
        loop {
            let unit = match self.read_unit(deadline).await {
                Ok(unit) => unit,
                Err(e) => return self.poison(e),
            };
            match classify(&unit, &tag) {
                UnitKind::Untagged => untagged.push(unit),
                UnitKind::Tagged(Status::Ok, text) => {
                    return Ok(CommandOutcome {
                        untagged,
                        tagged: text,
                    });
                }
                UnitKind::Tagged(_, text) => {
                    return self.poison(ImapError::Command(text));
                }
            }
        }
    }

    async fn write_all(&mut self, bytes: &[u8], deadline: Instant) -> Result<(), ImapError> {
        let write = async {
            self.stream.write_all(bytes).await?;
            self.stream.flush().await?;
            Ok::<(), std::io::Error>(())
        };
        match timeout_at(deadline, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ImapError::Transport(e.to_string())),
            Err(_) => Err(ImapError::CommandTimeout),
        }
    }

    /// One logical response unit: a line, plus the n literal bytes and the
    /// continuation line for every trailing `{n}` announcement.
    async fn read_unit(&mut self, deadline: Instant) -> Result<Vec<u8>, ImapError> {
        let mut unit = self.read_line(deadline).await?;
        while let Some(len) = trailing_literal_len(&unit)? {
            if len > MAX_LITERAL {
                return Err(ImapError::Parse(format!("literal of {} bytes refused", len)));
            }
            unit.extend_from_slice(b"\r\n");
            let literal = self.read_exact(len, deadline).await?;
            unit.extend_from_slice(&literal);
            let rest = self.read_line(deadline).await?;
            unit.extend_from_slice(&rest);
        }
        Ok(unit)
    }

    /// Next CRLF-terminated line, without the CRLF.
    async fn read_line(&mut self, deadline: Instant) -> Result<Vec<u8>, ImapError> {
        loop {
            if let Some(i) = self.buf[self.scanned..]
                .windows(2)
                .position(|w| w == b"\r\n")
            {
                let end = self.scanned + i;
                let mut line = self.buf.split_to(end + 2);
                line.truncate(end);
                self.scanned = 0;
                return Ok(line.to_vec());
            }
            self.scanned = self.buf.len().saturating_sub(1);
            self.fill(deadline).await?;
        }
    }

    /// Exactly `len` raw bytes. A connection close before the announced
    /// length is honored is fatal; the stream position is lost.
    async fn read_exact(&mut self, len: usize, deadline: Instant) -> Result<Vec<u8>, ImapError> {
        while self.buf.len() < len {
            if let Err(e) = self.fill(deadline).await {
                return match e {
                    ImapError::Transport(_) => Err(ImapError::Parse(
                        "connection closed inside a literal".into(),
                    )),
                    other => Err(other),
                };
            }
        }
        let data = self.buf.split_to(len).to_vec();
        self.scanned = 0;
        Ok(data)
    }

    async fn fill(&mut self, deadline: Instant) -> Result<(), ImapError> {
        self.buf.reserve(READ_CHUNK);
        match timeout_at(deadline, self.stream.read_buf(&mut self.buf)).await {
            Ok(Ok(0)) => Err(ImapError::Transport("connection closed".into())),
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ImapError::Transport(e.to_string())),
            Err(_) => Err(ImapError::CommandTimeout),
        }
    }
}

enum UnitKind {
    Untagged,
    Tagged(Status, String),
}

/// Decide whether a unit is the tagged terminator for `tag`. Anything else
/// (untagged `*` data, continuation `+`, other tags) stays in the untagged
/// pile.
fn classify(unit: &[u8], tag: &str) -> UnitKind {
    if unit.first() == Some(&b'*') || unit.first() == Some(&b'+') {
        return UnitKind::Untagged;
    }
    let text = String::from_utf8_lossy(unit);
    let mut words = text.split_whitespace();
    if words.next() == Some(tag) {
        let status = match words.next().map(|w| w.to_ascii_uppercase()) {
            Some(ref s) if s == "OK" => Some(Status::Ok),
            Some(ref s) if s == "NO" => Some(Status::No),
            Some(ref s) if s == "BAD" => Some(Status::Bad),
            _ => None,
        };
        if let Some(status) = status {
            return UnitKind::Tagged(status, text.into_owned());
        }
    }
    UnitKind::Untagged
}

/// Literal length announced at the end of a line, e.g. `... {310}`.
/// `Ok(None)` when the line does not end in an announcement; `Err` when it
/// does but the length cannot be parsed (stream position would be lost).
fn trailing_literal_len(line: &[u8]) -> Result<Option<usize>, ImapError> {
    if line.last() != Some(&b'}') {
        return Ok(None);
    }
    let Some(open) = line.iter().rposition(|&b| b == b'{') else {
        return Ok(None);
    };
    let digits = &line[open + 1..line.len() - 1];
    if digits.is_empty() || !digits.iter().all(|b| b.is_ascii_digit()) {
        return Err(ImapError::Parse("malformed literal announcement".into()));
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Some)
        .ok_or_else(|| ImapError::Parse("unparseable literal length".into()))
}
