//! Window fetcher
//!
//! Dials a sample feed and collects one window of a requested size.
//!
//! The whole fetch, connect included, runs against a single deadline. When
//! the deadline passes or the feed goes away, the samples gathered so far are
//! returned with [`WindowStatus::Incomplete`] instead of an error, so a slow
//! feed never hangs the caller and partial data is never silently dropped.
//! There is no reconnect; a caller that wants one fetches again.

use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::decoder;
use crate::config::defaults;
use crate::pipeline::{configure_keepalive, LineSource, MessageEvent, MessageSource};
use crate::types::{IncompleteReason, VibrationSample, Window, WindowStatus};

/// Fetch failures that leave no window at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Timed out before the connection was established")]
    Timeout,
}

/// Result of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedWindow {
    pub window: Window,
    pub status: WindowStatus,
    /// Messages that failed to decode and were skipped
    pub skipped: usize,
}

impl FetchedWindow {
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

/// Feed client that materializes one [`Window`] per call.
#[derive(Debug, Clone)]
pub struct WindowFetcher {
    endpoint: String,
    target_count: usize,
    timeout: Duration,
}

impl WindowFetcher {
    /// `endpoint` is `HOST:PORT`, optionally prefixed with `tcp://`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            target_count: defaults::TARGET_COUNT,
            timeout: Duration::from_millis(defaults::FETCH_TIMEOUT_MS),
        }
    }

    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = count;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch(&self) -> Result<FetchedWindow, FetchError> {
        fetch(&self.endpoint, self.target_count, self.timeout).await
    }
}

/// Connect to `endpoint` and collect up to `target_count` samples within
/// `timeout`.
///
/// # Errors
/// [`FetchError::Connection`] when the endpoint refuses or cannot be resolved,
/// [`FetchError::Timeout`] when the deadline passes before connecting.
pub async fn fetch(
    endpoint: &str,
    target_count: usize,
    timeout: Duration,
) -> Result<FetchedWindow, FetchError> {
    let deadline = Instant::now() + timeout;
    let addr = endpoint.strip_prefix("tcp://").unwrap_or(endpoint);

    info!(endpoint = %addr, target_count, timeout_ms = timeout.as_millis() as u64, "[Fetcher] Connecting");

    let stream = timeout_at(deadline, TcpStream::connect(addr))
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(|e| FetchError::Connection(format!("{addr}: {e}")))?;

    configure_keepalive(&stream);
    debug!(endpoint = %addr, "[Fetcher] Connected");

    let source = LineSource::new(stream, addr);
    Ok(fetch_from(source, target_count, deadline).await)
}

/// Accumulate samples from an already open source until `target_count` is
/// reached, the source ends, or `deadline` passes.
pub async fn fetch_from<S: MessageSource>(
    mut source: S,
    target_count: usize,
    deadline: Instant,
) -> FetchedWindow {
    let mut samples: Vec<VibrationSample> = Vec::with_capacity(target_count);
    let mut skipped = 0usize;

    let status = loop {
        if samples.len() >= target_count {
            break WindowStatus::Complete;
        }

        let event = match timeout_at(deadline, source.next_message()).await {
            Ok(event) => event,
            Err(_) => {
                break WindowStatus::Incomplete {
                    reason: IncompleteReason::TimedOut,
                }
            }
        };

        match event {
            Ok(MessageEvent::Message(message)) => match decoder::decode(&message) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    skipped += 1;
                    warn!(
                        source = %source.source_name(),
                        reason = %e.reason,
                        "[Fetcher] Skipping malformed sample"
                    );
                }
            },
            Ok(MessageEvent::Eof) => {
                break WindowStatus::Incomplete {
                    reason: IncompleteReason::ConnectionClosed,
                }
            }
            Err(e) => {
                break WindowStatus::Incomplete {
                    reason: IncompleteReason::ConnectionLost(e.to_string()),
                }
            }
        }
    };

    match &status {
        WindowStatus::Complete => info!(
            source = %source.source_name(),
            samples = samples.len(),
            skipped,
            "[Fetcher] Window complete"
        ),
        WindowStatus::Incomplete { reason } => warn!(
            source = %source.source_name(),
            samples = samples.len(),
            target_count,
            skipped,
            reason = %reason,
            "[Fetcher] Window incomplete"
        ),
    }

    FetchedWindow {
        window: Window::new(samples),
        status,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::encode;
    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Delivers whatever arrives on a channel; stalls while the channel is
    /// empty and reports Eof once every sender is gone.
    struct ChannelSource {
        rx: mpsc::UnboundedReceiver<std::io::Result<MessageEvent>>,
    }

    #[async_trait]
    impl MessageSource for ChannelSource {
        async fn next_message(&mut self) -> std::io::Result<MessageEvent> {
            self.rx.recv().await.unwrap_or(Ok(MessageEvent::Eof))
        }

        fn source_name(&self) -> &str {
            "channel"
        }
    }

    fn sample_line(i: usize) -> std::io::Result<MessageEvent> {
        let v = i as f64;
        Ok(MessageEvent::Message(encode(&VibrationSample::new(v, -v, 1.0))))
    }

    #[tokio::test]
    async fn test_stalled_source_times_out_with_partial_window() {
        let (tx, rx) = mpsc::unbounded_channel();
        for i in 0..3 {
            tx.send(sample_line(i)).unwrap();
        }

        let started = std::time::Instant::now();
        let deadline = Instant::now() + Duration::from_millis(100);
        let fetched = fetch_from(ChannelSource { rx }, 10, deadline).await;

        assert_eq!(fetched.window.len(), 3);
        assert_eq!(
            fetched.status,
            WindowStatus::Incomplete {
                reason: IncompleteReason::TimedOut
            }
        );
        assert!(started.elapsed() < Duration::from_secs(1));
        drop(tx);
    }

    #[tokio::test]
    async fn test_reaches_target_and_skips_malformed() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(sample_line(0)).unwrap();
        tx.send(Ok(MessageEvent::Message("{\"x\":1}".to_string())))
            .unwrap();
        for i in 1..6 {
            tx.send(sample_line(i)).unwrap();
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        let fetched = fetch_from(ChannelSource { rx }, 4, deadline).await;

        assert!(fetched.is_complete());
        assert_eq!(fetched.skipped, 1);
        let xs = fetched.window.axis_values(crate::types::Axis::X);
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_closed_and_lost_connections() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(sample_line(0)).unwrap();
        drop(tx);
        let fetched = fetch_from(ChannelSource { rx }, 5, Instant::now() + Duration::from_secs(5)).await;
        assert_eq!(fetched.window.len(), 1);
        assert_eq!(
            fetched.status,
            WindowStatus::Incomplete {
                reason: IncompleteReason::ConnectionClosed
            }
        );

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        )))
        .unwrap();
        let fetched = fetch_from(ChannelSource { rx }, 5, Instant::now() + Duration::from_secs(5)).await;
        assert!(fetched.window.is_empty());
        assert!(matches!(
            fetched.status,
            WindowStatus::Incomplete {
                reason: IncompleteReason::ConnectionLost(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_target_is_immediately_complete() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let fetched = fetch_from(ChannelSource { rx }, 0, Instant::now() + Duration::from_secs(5)).await;
        assert!(fetched.is_complete());
        assert!(fetched.window.is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetch(&addr.to_string(), 10, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Connection(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_fetch_over_tcp_partial_window() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            for i in 0..3 {
                let line = format!("{}\n", encode(&VibrationSample::new(i as f64, 0.0, 0.0)));
                stream.write_all(line.as_bytes()).await.unwrap();
            }
            // Hold the connection open past the fetch deadline
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let fetched = WindowFetcher::new(format!("tcp://{addr}"))
            .with_target_count(10)
            .with_timeout(Duration::from_millis(150))
            .fetch()
            .await
            .unwrap();

        assert_eq!(fetched.window.len(), 3);
        assert_eq!(
            fetched.status,
            WindowStatus::Incomplete {
                reason: IncompleteReason::TimedOut
            }
        );
        server.abort();
    }
}
