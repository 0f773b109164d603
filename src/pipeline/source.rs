//! Message source abstraction for sample ingestion.
//!
//! Both sides of the system read the same thing: an ordered stream of text
//! messages, one JSON record per line. The ingestion service reads it from
//! producer connections, the window fetcher from a feed connection. Tests
//! substitute in-memory sources.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Events produced by a message source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageEvent {
    /// One raw message (a single line, trimmed, never empty).
    Message(String),
    /// The remote side closed the stream.
    Eof,
}

/// Where text messages come from.
///
/// `next_message` is the only suspension point in the per-connection loops.
/// It is not cancel safe: dropping the future mid-line discards the partial
/// line, which is acceptable because callers only cancel to end the stream.
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next message.
    ///
    /// Returns `MessageEvent::Eof` on clean close and `Err` on I/O failure.
    async fn next_message(&mut self) -> std::io::Result<MessageEvent>;

    /// Human-readable name for logging (peer address, "stdin", ...).
    fn source_name(&self) -> &str;
}

// ============================================================================
// Line Source (newline-delimited messages over any async reader)
// ============================================================================

/// Reads newline-delimited messages from an async byte stream.
pub struct LineSource<R> {
    reader: BufReader<R>,
    line_buffer: String,
    name: String,
}

impl<R> LineSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_buffer: String::with_capacity(256),
            name: name.into(),
        }
    }
}

#[async_trait]
impl<R> MessageSource for LineSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_message(&mut self) -> std::io::Result<MessageEvent> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(MessageEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            return Ok(MessageEvent::Message(line.to_string()));
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_line_source_skips_blank_lines() {
        let data: &[u8] = b"{\"x\":1,\"y\":2,\"z\":3}\n\n  \r\n{\"x\":4,\"y\":5,\"z\":6}";
        let mut source = LineSource::new(data, "memory");

        assert_eq!(
            source.next_message().await.unwrap(),
            MessageEvent::Message(r#"{"x":1,"y":2,"z":3}"#.to_string())
        );
        // Final line has no trailing newline and is still delivered
        assert_eq!(
            source.next_message().await.unwrap(),
            MessageEvent::Message(r#"{"x":4,"y":5,"z":6}"#.to_string())
        );
        assert_eq!(source.next_message().await.unwrap(), MessageEvent::Eof);
        assert_eq!(source.source_name(), "memory");
    }

    #[tokio::test]
    async fn test_line_source_crlf() {
        let data: &[u8] = b"a\r\nb\r\n";
        let mut source = LineSource::new(data, "crlf");
        assert_eq!(
            source.next_message().await.unwrap(),
            MessageEvent::Message("a".to_string())
        );
        assert_eq!(
            source.next_message().await.unwrap(),
            MessageEvent::Message("b".to_string())
        );
        assert_eq!(source.next_message().await.unwrap(), MessageEvent::Eof);
    }

    #[tokio::test]
    async fn test_line_split_across_reads() {
        let mock = Builder::new()
            .read(b"{\"x\":1,")
            .read(b"\"y\":2,\"z\":3}\n")
            .read(b"\n")
            .build();
        let mut source = LineSource::new(mock, "mock");

        assert_eq!(
            source.next_message().await.unwrap(),
            MessageEvent::Message(r#"{"x":1,"y":2,"z":3}"#.to_string())
        );
        assert_eq!(source.next_message().await.unwrap(), MessageEvent::Eof);
    }

    #[tokio::test]
    async fn test_read_error_surfaces() {
        let mock = Builder::new()
            .read(b"{\"x\":1")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
            .build();
        let mut source = LineSource::new(mock, "mock");

        let err = source.next_message().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
