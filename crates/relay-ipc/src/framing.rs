//! Newline-delimited JSON framing for envelopes on byte streams.
//!
//! One envelope per `\n`-terminated line. Blank lines are skipped. A line that
//! is not UTF-8 or not a valid envelope is reported as
//! [`FrameError::Malformed`] and the reader stays usable for the next line.

use std::io;

use action_relay_core::Envelope;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed envelope: {reason}\n  line: {line}")]
    Malformed { line: String, reason: String },

    #[error("Failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Reads envelopes from an async byte stream.
pub struct EnvelopeReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> EnvelopeReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Read the next envelope, returning `None` on EOF.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Io`] if reading fails and
    /// [`FrameError::Malformed`] if a line does not parse
    pub async fn next_envelope(&mut self) -> Result<Option<Envelope>, FrameError> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf).await?;
            if n == 0 {
                return Ok(None); // EOF
            }

            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    return Err(FrameError::Malformed {
                        line: String::from_utf8_lossy(&self.buf).trim().to_string(),
                        reason: e.to_string(),
                    });
                }
            };
            if line.is_empty() {
                continue;
            }

            return serde_json::from_str(line)
                .map(Some)
                .map_err(|e| FrameError::Malformed {
                    line: line.to_string(),
                    reason: e.to_string(),
                });
        }
    }
}

/// Write one envelope as a single line and flush.
///
/// # Errors
///
/// Returns an error if encoding, writing or flushing fails.
pub async fn write_envelope<W: AsyncWrite + Unpin>(
    writer: &mut W,
    envelope: &Envelope,
) -> Result<(), FrameError> {
    let json = serde_json::to_string(envelope).map_err(FrameError::Encode)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_relay_core::{Action, Endpoint, WindowId};

    #[tokio::test]
    async fn test_parse_single_line() {
        let input = b"{\"channel\":\"GLOBAL_ACTION\",\"sender\":\"coordinator\",\"action\":{\"type\":\"A\"}}\n";
        let mut reader = EnvelopeReader::new(&input[..]);
        let envelope = reader.next_envelope().await.unwrap().unwrap();
        assert_eq!(envelope.sender, Endpoint::Coordinator);
        assert_eq!(envelope.action.kind(), Some("A"));
        assert!(reader.next_envelope().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skips_blank_lines() {
        let input = b"\n\r\n{\"channel\":\"X\",\"sender\":{\"window\":1},\"action\":{\"type\":\"B\"}}\n\n";
        let mut reader = EnvelopeReader::new(&input[..]);
        let envelope = reader.next_envelope().await.unwrap().unwrap();
        assert_eq!(envelope.sender, Endpoint::Window(WindowId(1)));
        assert!(reader.next_envelope().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_then_recovers() {
        let input = b"not json\n{\"channel\":\"X\",\"sender\":\"coordinator\",\"action\":{}}\n";
        let mut reader = EnvelopeReader::new(&input[..]);

        let err = reader.next_envelope().await.unwrap_err();
        assert!(matches!(err, FrameError::Malformed { ref line, .. } if line == "not json"));

        let envelope = reader.next_envelope().await.unwrap().unwrap();
        assert_eq!(envelope.action.kind(), None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_then_recovers() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(b"{\"channel\":\"X\",\"sender\":\"coordinator\",\"action\":{\"type\":\"OK\"}}\n");
        let mut reader = EnvelopeReader::new(&input[..]);

        let err = reader.next_envelope().await.unwrap_err();
        assert!(matches!(err, FrameError::Malformed { ref reason, .. } if reason.contains("utf-8")));

        let envelope = reader.next_envelope().await.unwrap().unwrap();
        assert_eq!(envelope.action.kind(), Some("OK"));
    }

    #[tokio::test]
    async fn test_ill_typed_markers_are_not_malformed() {
        let input = b"{\"channel\":\"X\",\"sender\":\"coordinator\",\"action\":{\"type\":\"A\",\"global\":\"yes\"}}\n";
        let mut reader = EnvelopeReader::new(&input[..]);

        let envelope = reader.next_envelope().await.unwrap().unwrap();
        assert_eq!(envelope.action.kind(), Some("A"));
        assert!(!envelope.action.has_global_marker());
        assert_eq!(
            envelope.action.fields.get("global"),
            Some(&serde_json::json!("yes"))
        );
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let envelope = Envelope::new(
            "GLOBAL_ACTION",
            Endpoint::Window(WindowId(3)),
            Action::new("SET_TITLE").with_field("title", "multi\nline"),
        );

        let mut buf = Vec::new();
        write_envelope(&mut buf, &envelope).await.unwrap();
        write_envelope(&mut buf, &envelope).await.unwrap();
        assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 2);

        let mut reader = EnvelopeReader::new(&buf[..]);
        assert_eq!(reader.next_envelope().await.unwrap().unwrap(), envelope);
        assert_eq!(reader.next_envelope().await.unwrap().unwrap(), envelope);
        assert!(reader.next_envelope().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_returns_none() {
        let mut reader = EnvelopeReader::new(&b""[..]);
        assert!(reader.next_envelope().await.unwrap().is_none());
    }
}
