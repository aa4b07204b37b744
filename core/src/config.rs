/*
 * config.rs
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

//! Session configuration: server coordinates, credentials, timeouts.
//! Deserializable so the surrounding application can load it from its own
//! configuration store; the engine itself reads nothing from disk.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 993;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 8_000;

/// Parameters for one IMAP session: host/port, plain LOGIN credentials,
/// the connect deadline (TLS handshake + greeting) and the per-command
/// deadline (one tagged exchange).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Accept self-signed / unverifiable server certificates. On by default
    /// because the providers this engine targets commonly present chains the
    /// platform store cannot verify; see `net` for the verifier.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_command_timeout_ms() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_MS
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl SessionConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: password.into(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            accept_invalid_certs: true,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_on_deserialize() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{"host":"imap.example.de","user":"info@example.de","password":"pw"}"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 993);
        assert_eq!(cfg.connect_timeout(), Duration::from_millis(5_000));
        assert_eq!(cfg.command_timeout(), Duration::from_millis(8_000));
        assert!(cfg.accept_invalid_certs);
    }
}
