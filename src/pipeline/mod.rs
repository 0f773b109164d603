//! Collector pipeline
//!
//! producers → [`IngestionService`] → [`WindowBuffer`] → [`SampleFeed`] → fetchers
//!
//! The buffer is the only shared state. It is built once and handed to the
//! ingestion service, the feed and the HTTP API by `Arc`.

pub mod buffer;
pub mod feed;
pub mod ingestion;
pub mod source;

pub use buffer::{BufferStats, WindowBuffer};
pub use feed::SampleFeed;
pub use ingestion::{
    ConnectionOutcome, ConnectionSummary, IngestionService, IngestionSnapshot, IngestionStats,
};
pub use source::{LineSource, MessageEvent, MessageSource};

use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::defaults::{TCP_KEEPALIVE_INTERVAL_SECS, TCP_KEEPALIVE_TIME_SECS};

/// Enable TCP keepalive so half-dead peers are noticed.
///
/// Best-effort: a platform that refuses the option still gets a working
/// connection.
pub(crate) fn configure_keepalive(stream: &TcpStream) {
    let sock_ref = socket2::SockRef::from(stream);
    let keepalive = socket2::TcpKeepalive::new()
        .with_time(Duration::from_secs(TCP_KEEPALIVE_TIME_SECS))
        .with_interval(Duration::from_secs(TCP_KEEPALIVE_INTERVAL_SECS));
    if let Err(e) = sock_ref.set_tcp_keepalive(&keepalive) {
        tracing::debug!(error = %e, "Could not enable TCP keepalive");
    }
}
