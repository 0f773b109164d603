//! Sample feed
//!
//! Consumer-facing stream of accepted samples. A subscriber connects, receives
//! the configured backlog from the window buffer, then every newly appended
//! sample as one JSON line, until either side hangs up. The window fetcher
//! dials this endpoint.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::buffer::WindowBuffer;
use crate::acquisition::decoder;
use crate::types::VibrationSample;

/// Fan-out of buffered samples to feed subscribers.
#[derive(Clone)]
pub struct SampleFeed {
    buffer: Arc<WindowBuffer>,
    backlog: usize,
}

impl SampleFeed {
    /// `backlog` is how many buffered samples a new subscriber receives first.
    pub fn new(buffer: Arc<WindowBuffer>, backlog: usize) -> Self {
        Self { buffer, backlog }
    }

    /// Accept subscribers until `cancel` fires.
    pub async fn run(&self, listener: TcpListener, cancel: CancellationToken) {
        let local = listener
            .local_addr()
            .map_or_else(|_| "unknown".to_string(), |a| a.to_string());
        info!(address = %local, backlog = self.backlog, "[Feed] Accepting subscribers");

        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[Feed] Received shutdown signal");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            super::configure_keepalive(&stream);
                            let feed = self.clone();
                            let sub_cancel = cancel.child_token();
                            tracker.spawn(async move {
                                info!(subscriber = %peer, "[Feed] Subscriber connected");
                                match feed.stream_to(stream, sub_cancel).await {
                                    Ok(sent) => info!(subscriber = %peer, sent = sent, "[Feed] Subscriber finished"),
                                    Err(e) => debug!(subscriber = %peer, error = %e, "[Feed] Subscriber dropped"),
                                }
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "[Feed] Accept failed");
                            tokio::time::sleep(std::time::Duration::from_millis(
                                crate::config::defaults::ACCEPT_ERROR_BACKOFF_MS,
                            ))
                            .await;
                        }
                    }
                }
            }
        }

        tracker.close();
        tracker.wait().await;
        info!("[Feed] Stopped");
    }

    /// Write backlog then live samples to `stream` until cancellation, the
    /// subscriber hanging up, or a write error. Returns the number of samples
    /// written.
    ///
    /// Anything the subscriber sends is discarded; end of its stream ends the
    /// subscription even while no samples are flowing.
    pub async fn stream_to<S>(&self, stream: S, cancel: CancellationToken) -> std::io::Result<u64>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let (mut reader, writer) = tokio::io::split(stream);
        let mut writer = BufWriter::new(writer);
        let (backlog, mut receiver) = self.buffer.subscribe(self.backlog);
        let mut sent = 0u64;
        let mut discard = [0u8; 64];

        for sample in backlog.samples() {
            write_sample(&mut writer, sample).await?;
            sent += 1;
        }
        writer.flush().await?;

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                read = reader.read(&mut discard) => match read {
                    Ok(0) | Err(_) => {
                        debug!(sent = sent, "[Feed] Subscriber hung up");
                        return Ok(sent);
                    }
                    Ok(_) => continue,
                },
                received = receiver.recv() => received,
            };

            match received {
                Ok(sample) => {
                    write_sample(&mut writer, &sample).await?;
                    sent += 1;
                    // Drain whatever else is already queued before flushing
                    while let Ok(sample) = receiver.try_recv() {
                        write_sample(&mut writer, &sample).await?;
                        sent += 1;
                    }
                    writer.flush().await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "[Feed] Subscriber lagging, samples skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }

        writer.flush().await?;
        Ok(sent)
    }
}

async fn write_sample<W>(writer: &mut W, sample: &VibrationSample) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = decoder::encode(sample);
    line.push('\n');
    writer.write_all(line.as_bytes()).await
}
