//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery. Values that operators tune live in
//! [`VibrascopeConfig`](super::VibrascopeConfig) and take their defaults from
//! here.

// ============================================================================
// Network
// ============================================================================

/// Producer ingestion listener.
pub const INGEST_ADDR: &str = "0.0.0.0:9090";

/// Sample feed listener (window fetchers dial this).
pub const FEED_ADDR: &str = "0.0.0.0:9091";

/// HTTP API listener.
pub const HTTP_ADDR: &str = "0.0.0.0:8080";

/// Delay after a failed `accept()` before trying again (ms).
pub const ACCEPT_ERROR_BACKOFF_MS: u64 = 100;

/// Idle time before the first TCP keepalive probe (seconds).
pub const TCP_KEEPALIVE_TIME_SECS: u64 = 30;

/// Interval between TCP keepalive probes (seconds).
pub const TCP_KEEPALIVE_INTERVAL_SECS: u64 = 10;

// ============================================================================
// Buffer
// ============================================================================

/// Window buffer capacity (samples).
///
/// 5 000 samples ≈ 3 s of data at 1 600 Hz.
pub const WINDOW_CAPACITY: usize = 5_000;

/// Buffered samples replayed to a new feed subscriber. 0 = live only.
pub const FEED_BACKLOG: usize = 0;

/// Per-subscriber broadcast queue depth before a slow subscriber starts
/// skipping samples.
pub const FEED_CHANNEL_CAPACITY: usize = 8_192;

// ============================================================================
// Analysis
// ============================================================================

/// Accelerometer sampling rate (Hz).
pub const SAMPLING_RATE_HZ: f64 = 1_600.0;

/// Wavelet family for the DWT panel.
pub const WAVELET: &str = "db4";

/// DWT decomposition depth.
pub const DECOMPOSITION_LEVELS: usize = 4;

// ============================================================================
// Fetch
// ============================================================================

/// Feed endpoint the `analyze` command dials.
pub const FETCH_ENDPOINT: &str = "127.0.0.1:9091";

/// Samples per analysis window.
pub const TARGET_COUNT: usize = 500;

/// Upper bound on one fetch, connect included (ms).
pub const FETCH_TIMEOUT_MS: u64 = 10_000;
