//! Ingestion service
//!
//! Accepts any number of producer connections. Each connection gets its own
//! task that reads newline-delimited JSON samples until the producer hangs up,
//! decoding each message and appending it to the shared [`WindowBuffer`].
//!
//! A malformed message is logged and counted, never fatal. An I/O error ends
//! only the connection it happened on. The accept loop runs until the
//! cancellation token fires.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::buffer::WindowBuffer;
use super::source::{LineSource, MessageEvent, MessageSource};
use crate::acquisition::decoder;
use crate::config::defaults::ACCEPT_ERROR_BACKOFF_MS;

// ============================================================================
// Counters
// ============================================================================

/// Service-wide ingestion counters, shared with the status endpoint.
#[derive(Debug, Default)]
pub struct IngestionStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    active_connections: AtomicU64,
    total_connections: AtomicU64,
}

/// Point-in-time copy of [`IngestionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestionSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub active_connections: u64,
    pub total_connections: u64,
}

impl IngestionStats {
    pub fn snapshot(&self) -> IngestionSnapshot {
        IngestionSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            total_connections: self.total_connections.load(Ordering::Relaxed),
        }
    }
}

/// How a producer connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Producer closed the stream.
    Closed,
    /// Read failed; the connection was dropped.
    Failed(String),
    /// Service shutdown.
    Cancelled,
}

/// Per-connection tally returned when a connection loop ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub accepted: u64,
    pub rejected: u64,
    pub outcome: ConnectionOutcome,
}

// ============================================================================
// Service
// ============================================================================

/// Producer-facing ingestion endpoint.
#[derive(Clone)]
pub struct IngestionService {
    buffer: Arc<WindowBuffer>,
    stats: Arc<IngestionStats>,
}

impl IngestionService {
    pub fn new(buffer: Arc<WindowBuffer>) -> Self {
        Self {
            buffer,
            stats: Arc::new(IngestionStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<IngestionStats> {
        Arc::clone(&self.stats)
    }

    pub fn buffer(&self) -> &Arc<WindowBuffer> {
        &self.buffer
    }

    /// Accept producer connections until `cancel` fires.
    ///
    /// On shutdown, waits for the per-connection tasks to observe the
    /// cancellation and exit.
    pub async fn run(&self, listener: TcpListener, cancel: CancellationToken) {
        let local = listener
            .local_addr()
            .map_or_else(|_| "unknown".to_string(), |a| a.to_string());
        info!(address = %local, "[Ingestion] Accepting producer connections");

        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[Ingestion] Received shutdown signal");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            super::configure_keepalive(&stream);
                            let service = self.clone();
                            let conn_cancel = cancel.child_token();
                            tracker.spawn(async move {
                                let source = LineSource::new(stream, peer.to_string());
                                service.serve_connection(source, Some(peer), conn_cancel).await;
                            });
                        }
                        Err(e) => {
                            // Typically fd exhaustion; back off instead of spinning.
                            warn!(error = %e, "[Ingestion] Accept failed");
                            tokio::time::sleep(Duration::from_millis(ACCEPT_ERROR_BACKOFF_MS)).await;
                        }
                    }
                }
            }
        }

        tracker.close();
        tracker.wait().await;
        let stats = self.stats.snapshot();
        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            connections = stats.total_connections,
            "[Ingestion] Stopped"
        );
    }

    /// Run the read-decode-append loop for one producer.
    pub async fn serve_connection<S: MessageSource>(
        &self,
        mut source: S,
        peer: Option<SocketAddr>,
        cancel: CancellationToken,
    ) -> ConnectionSummary {
        self.stats.total_connections.fetch_add(1, Ordering::Relaxed);
        self.stats.active_connections.fetch_add(1, Ordering::Relaxed);
        info!(producer = %source.source_name(), "[Ingestion] Producer connected");

        let mut accepted = 0u64;
        let mut rejected = 0u64;

        let outcome = loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break ConnectionOutcome::Cancelled,
                event = source.next_message() => event,
            };

            match event {
                Ok(MessageEvent::Message(message)) => match decoder::decode(&message) {
                    Ok(sample) => {
                        self.buffer.append(sample);
                        accepted += 1;
                        self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        rejected += 1;
                        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            producer = %source.source_name(),
                            reason = %e.reason,
                            message = %e.message,
                            "[Ingestion] Dropping malformed sample"
                        );
                    }
                },
                Ok(MessageEvent::Eof) => break ConnectionOutcome::Closed,
                Err(e) => break ConnectionOutcome::Failed(e.to_string()),
            }
        };

        self.stats.active_connections.fetch_sub(1, Ordering::Relaxed);

        match &outcome {
            ConnectionOutcome::Failed(e) => warn!(
                producer = %source.source_name(),
                error = %e,
                accepted = accepted,
                rejected = rejected,
                "[Ingestion] Producer connection failed"
            ),
            _ => info!(
                producer = %source.source_name(),
                peer = ?peer,
                accepted = accepted,
                rejected = rejected,
                outcome = ?outcome,
                "[Ingestion] Producer disconnected"
            ),
        }
        debug!(buffered = self.buffer.len(), "[Ingestion] Buffer level");

        ConnectionSummary {
            accepted,
            rejected,
            outcome,
        }
    }
}
