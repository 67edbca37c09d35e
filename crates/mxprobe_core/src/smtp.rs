//! Raw SMTP handshake probe against a resolved mail exchanger.
//!
//! The probe plays out HELO / MAIL FROM / RCPT TO / QUIT over a plain TCP
//! connection, reading one response chunk after each command. It never
//! sends message content and never retries; any connect, write or read
//! failure aborts the probe and is surfaced to the pipeline.

use crate::record::SmtpResponse;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// A probe that could not complete its four-exchange dialogue.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("SMTP I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SMTP step timed out after {0}ms")]
    Timeout(u64),
    #[error("connection closed before the dialogue completed")]
    ConnectionClosed,
}

/// Plays the fixed four-command dialogue against mail exchangers.
pub struct SmtpProbe {
    timeout_ms: u64,
    helo_domain: String,
    port: u16,
}

impl SmtpProbe {
    pub fn new(timeout_ms: u64, helo_domain: impl Into<String>, port: u16) -> Self {
        Self {
            timeout_ms,
            helo_domain: helo_domain.into(),
            port,
        }
    }

    /// Run the dialogue and return exactly four parsed responses.
    ///
    /// Each connect and read is individually bounded by the configured
    /// timeout. The connection is closed on every exit path when the
    /// stream drops.
    pub async fn probe(
        &self,
        mx_host: &str,
        target_address: &str,
    ) -> Result<Vec<SmtpResponse>, ProbeError> {
        debug!("probing {} for {}", mx_host, target_address);

        let mut stream = self
            .bounded(TcpStream::connect((mx_host, self.port)))
            .await??;

        let commands = [
            format!("HELO {}\r\n", self.helo_domain),
            format!("MAIL FROM: <test@{}>\r\n", self.helo_domain),
            format!("RCPT TO: <{target_address}>\r\n"),
            "QUIT\r\n".to_string(),
        ];

        let mut responses = Vec::with_capacity(commands.len());
        for command in &commands {
            stream.write_all(command.as_bytes()).await?;
            let raw = self.read_chunk(&mut stream).await?;
            responses.push(parse_response(&raw));
        }

        Ok(responses)
    }

    /// One read of up to 1 KiB, matching the original single-recv dialogue.
    async fn read_chunk(&self, stream: &mut TcpStream) -> Result<String, ProbeError> {
        let mut buffer = vec![0u8; 1024];
        let read = self.bounded(stream.read(&mut buffer)).await??;
        if read == 0 {
            return Err(ProbeError::ConnectionClosed);
        }
        Ok(String::from_utf8_lossy(&buffer[..read]).into_owned())
    }

    async fn bounded<F: std::future::Future>(&self, future: F) -> Result<F::Output, ProbeError> {
        tokio::time::timeout(std::time::Duration::from_millis(self.timeout_ms), future)
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout_ms))
    }
}

/// Parse one raw SMTP reply into code, extended-status subcode and message.
///
/// The first three characters are the reply code. A subcode is present only
/// when the characters at offsets 4, 6 and 8 are all digits, in which case
/// it is the five-character slice at offset 4. The message is the raw text
/// with the code, the `code-` continuation form, the subcode and line
/// terminators stripped, then trimmed — continuation lines are handled
/// textually, not tokenized.
pub fn parse_response(raw: &str) -> SmtpResponse {
    let code: String = raw.chars().take(3).collect();

    let bytes = raw.as_bytes();
    let digit_at = |index: usize| bytes.get(index).is_some_and(u8::is_ascii_digit);
    let subcode = if digit_at(4) && digit_at(6) && digit_at(8) {
        raw.get(4..9).unwrap_or_default().to_string()
    } else {
        String::new()
    };

    let mut message = raw.to_string();
    if !code.is_empty() {
        message = message.replace(&code, "");
        message = message.replace(&format!("{code}-"), "");
    }
    if !subcode.is_empty() {
        message = message.replace(&subcode, "");
    }
    let message = message.replace("\r\n", " ").trim().to_string();

    SmtpResponse {
        code,
        subcode,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::net::TcpListener;

    /// A scripted mail exchanger: reads one command, sends the next reply,
    /// and hands the received commands back when the dialogue ends.
    async fn scripted_server(
        replies: Vec<&'static str>,
    ) -> (u16, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut commands = Vec::new();
            let mut buffer = vec![0u8; 1024];
            for reply in replies {
                let read = stream.read(&mut buffer).await.unwrap();
                commands.push(String::from_utf8_lossy(&buffer[..read]).into_owned());
                stream.write_all(reply.as_bytes()).await.unwrap();
            }
            commands
        });
        (port, handle)
    }

    #[tokio::test]
    async fn dialogue_sends_four_commands_and_collects_four_responses() {
        let (port, server) = scripted_server(vec![
            "220 mx.local ESMTP\r\n",
            "250 Hello\r\n",
            "250 Sender OK\r\n",
            "250 2.1.0 Recipient OK\r\n",
        ])
        .await;

        let probe = SmtpProbe::new(2000, "fancydomain.com", port);
        let responses = probe.probe("127.0.0.1", "user@example.com").await.unwrap();

        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0].code, "220");
        assert_eq!(responses[3].code, "250");
        assert_eq!(responses[3].subcode, "2.1.0");

        let commands = server.await.unwrap();
        assert_eq!(commands[0], "HELO fancydomain.com\r\n");
        assert_eq!(commands[1], "MAIL FROM: <test@fancydomain.com>\r\n");
        assert_eq!(commands[2], "RCPT TO: <user@example.com>\r\n");
        assert_eq!(commands[3], "QUIT\r\n");
    }

    #[tokio::test]
    async fn early_close_aborts_the_dialogue() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = [0u8; 1024];
            // Read the HELO, then hang up without replying.
            let _ = stream.read(&mut buffer).await;
        });

        let probe = SmtpProbe::new(2000, "fancydomain.com", port);
        let error = probe
            .probe("127.0.0.1", "user@example.com")
            .await
            .unwrap_err();
        assert!(matches!(error, ProbeError::ConnectionClosed));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_an_io_error() {
        // Bind and immediately drop to get a port with no listener.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = SmtpProbe::new(2000, "fancydomain.com", port);
        let error = probe
            .probe("127.0.0.1", "user@example.com")
            .await
            .unwrap_err();
        assert!(matches!(error, ProbeError::Io(_)));
    }

    #[test]
    fn parses_reply_with_subcode() {
        assert_eq!(
            parse_response("250 2.1.0 OK\r\n"),
            SmtpResponse {
                code: "250".to_string(),
                subcode: "2.1.0".to_string(),
                message: "OK".to_string(),
            }
        );
    }

    #[test]
    fn parses_reply_without_subcode() {
        assert_eq!(
            parse_response("550 No such user\r\n"),
            SmtpResponse {
                code: "550".to_string(),
                subcode: "".to_string(),
                message: "No such user".to_string(),
            }
        );
    }

    #[test]
    fn parses_greeting_banner() {
        let parsed = parse_response("220 mx.example.com ESMTP ready\r\n");
        assert_eq!(parsed.code, "220");
        assert_eq!(parsed.subcode, "");
        assert_eq!(parsed.message, "mx.example.com ESMTP ready");
    }

    #[test]
    fn strips_continuation_form_textually() {
        let parsed = parse_response("250-mx.example.com\r\n250 SIZE 35882577\r\n");
        assert_eq!(parsed.code, "250");
        assert!(!parsed.message.contains("250"));
    }

    #[test]
    fn tolerates_truncated_input() {
        let parsed = parse_response("25");
        assert_eq!(parsed.code, "25");
        assert_eq!(parsed.subcode, "");
    }

    #[test]
    fn offset_digits_gate_the_subcode() {
        // "5.7.1" at offset 4 qualifies; a word does not.
        assert_eq!(parse_response("554 5.7.1 Rejected\r\n").subcode, "5.7.1");
        assert_eq!(parse_response("554 Denied 5.7.1\r\n").subcode, "");
    }
}
