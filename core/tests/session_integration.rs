/*
 * session_integration.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration test for the IMAP session façade. Drives a full
 * greeting → LOGIN → LIST → SELECT → FETCH → STATUS → LOGOUT cycle
 * against a scripted server on an in-memory duplex stream, including
 * literal-bearing FETCH responses and the failure paths (bad credentials,
 * missing greeting).
 *
 * Run with:
 *   cargo test -p mailbridge_core --test session_integration
 */

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use mailbridge_core::protocol::imap::{ImapError, ImapSession, SpecialUse};
use mailbridge_core::SessionConfig;

fn test_config() -> SessionConfig {
    let mut cfg = SessionConfig::new("imap.example.de", "info@firma.de", "geheim");
    cfg.connect_timeout_ms = 2_000;
    cfg.command_timeout_ms = 2_000;
    cfg
}

async fn read_command(stream: &mut DuplexStream) -> Option<String> {
    let mut out = Vec::new();
    let mut b = [0u8; 1];
    loop {
        match stream.read_exact(&mut b).await {
            Ok(_) => {}
            Err(_) => return None,
        }
        out.push(b[0]);
        if out.ends_with(b"\r\n") {
            out.truncate(out.len() - 2);
            return Some(String::from_utf8_lossy(&out).into_owned());
        }
    }
}

async fn send(stream: &mut DuplexStream, data: &[u8]) {
    stream.write_all(data).await.unwrap();
    stream.flush().await.unwrap();
}

fn full_message() -> Vec<u8> {
    b"From: \"Anna Schmidt\" <anna@example.de>\r\n\
To: info@firma.de\r\n\
Subject: =?UTF-8?Q?Umzug_n=C3=A4chste_Woche?=\r\n\
Date: Mon, 7 Jul 2025 09:15:00 +0200\r\n\
Content-Type: multipart/alternative; boundary=\"B1\"\r\n\
\r\n\
--B1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Guten Tag, passt Freitag?\r\n\
--B1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Guten Tag, passt Freitag?</p>\r\n\
--B1--\r\n"
        .to_vec()
}

/// Scripted IMAP server: greets, then answers each tagged command until
/// LOGOUT or stream close.
async fn run_server(mut stream: DuplexStream, reject_login: bool) {
    send(&mut stream, b"* OK IMAP4rev1 server ready\r\n").await;
    while let Some(line) = read_command(&mut stream).await {
        let Some((tag, command)) = line.split_once(' ') else {
            continue;
        };
        let upper = command.to_ascii_uppercase();
        if upper.starts_with("LOGIN") {
            if reject_login {
                send(
                    &mut stream,
                    format!("{} NO [AUTHENTICATIONFAILED] Authentication failed\r\n", tag)
                        .as_bytes(),
                )
                .await;
            } else {
                send(&mut stream, format!("{} OK LOGIN completed\r\n", tag).as_bytes()).await;
            }
        } else if upper.starts_with("LIST") {
            send(
                &mut stream,
                format!(
                    "* LIST (\\HasChildren) \".\" \"INBOX\"\r\n\
* LIST (\\HasNoChildren) \".\" \"INBOX.Gesendet\"\r\n\
* LIST (\\HasNoChildren \\Trash) \".\" \"INBOX.Papierkorb\"\r\n\
* LIST (\\HasNoChildren) \".\" \"INBOX.Kunden\"\r\n\
{} OK LIST completed\r\n",
                    tag
                )
                .as_bytes(),
            )
            .await;
        } else if upper.starts_with("SELECT") {
            send(
                &mut stream,
                format!(
                    "* 3 EXISTS\r\n\
* 0 RECENT\r\n\
* OK [UIDVALIDITY 17] UIDs valid\r\n\
* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
{} OK [READ-WRITE] SELECT completed\r\n",
                    tag
                )
                .as_bytes(),
            )
            .await;
        } else if upper.starts_with("STATUS") {
            send(
                &mut stream,
                format!(
                    "* STATUS \"INBOX\" (MESSAGES 3 UNSEEN 1)\r\n{} OK STATUS completed\r\n",
                    tag
                )
                .as_bytes(),
            )
            .await;
        } else if upper.starts_with("UID FETCH 42") {
            let message = full_message();
            let mut response = format!(
                "* 2 FETCH (UID 42 FLAGS (\\Seen) BODY[] {{{}}}\r\n",
                message.len()
            )
            .into_bytes();
            response.extend_from_slice(&message);
            response.extend_from_slice(b")\r\n");
            response.extend_from_slice(format!("{} OK UID FETCH completed\r\n", tag).as_bytes());
            send(&mut stream, &response).await;
        } else if upper.starts_with("UID FETCH") {
            send(&mut stream, format!("{} OK UID FETCH completed\r\n", tag).as_bytes()).await;
        } else if upper.starts_with("FETCH") {
            send(
                &mut stream,
                format!(
                    "* 1 FETCH (UID 101 FLAGS (\\Seen) ENVELOPE (\"Mon, 7 Jul 2025 08:00:00 +0200\" \"Erste Anfrage\" ((\"Anna Schmidt\" NIL \"anna\" \"example.de\")) NIL NIL ((NIL NIL \"info\" \"firma.de\")) NIL NIL NIL \"<m1@example.de>\"))\r\n\
* 2 FETCH (UID 102 FLAGS () ENVELOPE (\"Mon, 7 Jul 2025 09:00:00 +0200\" \"=?UTF-8?Q?R=C3=BCckfrage?=\" ((NIL NIL \"jan\" \"beispiel.de\")) NIL NIL ((NIL NIL \"info\" \"firma.de\")) NIL NIL NIL \"<m2@example.de>\"))\r\n\
* 3 FETCH (UID 103 FLAGS (\\Answered) ENVELOPE (\"Mon, 7 Jul 2025 10:00:00 +0200\" \"Termin am Freitag\" ((NIL NIL \"kunde\" \"web.de\")) NIL NIL ((NIL NIL \"info\" \"firma.de\")) NIL NIL NIL \"<m3@example.de>\"))\r\n\
{} OK FETCH completed\r\n",
                    tag
                )
                .as_bytes(),
            )
            .await;
        } else if upper.starts_with("LOGOUT") {
            send(
                &mut stream,
                format!("* BYE logging out\r\n{} OK LOGOUT completed\r\n", tag).as_bytes(),
            )
            .await;
            break;
        } else {
            send(&mut stream, format!("{} OK\r\n", tag).as_bytes()).await;
        }
    }
}

#[tokio::test]
async fn full_session_cycle() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(run_server(server, false));

    let cfg = test_config();
    let mut session = ImapSession::attach(client, &cfg).await.unwrap();

    // Folders: classification via flags and via the German name table.
    let folders = session.list_folders().await.unwrap();
    assert_eq!(folders.len(), 4);
    let by_path = |p: &str| folders.iter().find(|f| f.path == p).unwrap();
    assert_eq!(by_path("INBOX").special_use, Some(SpecialUse::Inbox));
    assert_eq!(by_path("INBOX.Gesendet").special_use, Some(SpecialUse::Sent));
    assert_eq!(by_path("INBOX.Papierkorb").special_use, Some(SpecialUse::Trash));
    assert_eq!(by_path("INBOX.Kunden").special_use, None);
    assert_eq!(by_path("INBOX.Gesendet").level, 1);
    assert_eq!(by_path("INBOX.Gesendet").name, "Gesendet");
    assert!(!by_path("INBOX.Gesendet").has_children);

    // Page 1: three messages, newest (highest sequence number) first.
    let page = session.list_messages("INBOX", 1, 50).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.messages.len(), 3);
    assert_eq!(page.messages[0].uid, 103);
    assert_eq!(page.messages[2].uid, 101);
    assert_eq!(page.messages[1].subject, "R\u{fc}ckfrage");
    assert_eq!(page.messages[2].from.as_ref().unwrap().name, "Anna Schmidt");
    assert!(page.messages[0].date.is_some());

    // A page beyond the mailbox: empty result, real total, no FETCH issued.
    let beyond = session.list_messages("INBOX", 5, 50).await.unwrap();
    assert!(beyond.messages.is_empty());
    assert_eq!(beyond.total, 3);

    // Single message by UID, with multipart body and literal transport.
    let body = session.read_message("INBOX", 42, false).await.unwrap();
    assert_eq!(body.uid, 42);
    assert_eq!(body.subject, "Umzug n\u{e4}chste Woche");
    assert_eq!(body.text, "Guten Tag, passt Freitag?");
    assert_eq!(body.html.as_deref(), Some("<p>Guten Tag, passt Freitag?</p>"));
    assert!(body.attachments.is_empty());

    // Unknown UID is NotFound, not an empty success.
    match session.read_message("INBOX", 9999, false).await {
        Err(ImapError::NotFound(9999)) => {}
        other => panic!("expected NotFound, got {:?}", other.map(|b| b.uid)),
    }

    // STATUS counts.
    let status = session.folder_status("INBOX").await.unwrap();
    assert_eq!(status.messages, 3);
    assert_eq!(status.unseen, 1);

    session.logout().await;
    server_task.await.unwrap();
}

#[tokio::test]
async fn wrong_password_surfaces_auth_error() {
    let (client, server) = tokio::io::duplex(8 * 1024);
    let server_task = tokio::spawn(run_server(server, true));

    let err = ImapSession::attach(client, &test_config()).await.unwrap_err();
    match err {
        ImapError::Auth(text) => assert!(text.contains("AUTHENTICATIONFAILED")),
        other => panic!("expected Auth error, got {:?}", other),
    }
    server_task.await.unwrap();
}

#[tokio::test]
async fn missing_greeting_times_out() {
    let (client, server) = tokio::io::duplex(1024);
    let mut cfg = test_config();
    cfg.connect_timeout_ms = 100;

    let err = ImapSession::attach(client, &cfg).await.unwrap_err();
    assert!(matches!(err, ImapError::ConnectTimeout));
    drop(server);
}
