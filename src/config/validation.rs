//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse: the raw TOML is first walked as a `toml::Value` and every
//! key path compared against the known set, producing "did you mean?"
//! warnings. Warnings never reject a config. Range checks run after serde
//! deserialization and do reject it.

use std::collections::HashSet;
use std::net::SocketAddr;

use super::VibrascopeConfig;
use crate::processing::WaveletFamily;

/// A non-fatal config warning (typo, unknown key).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

/// Every valid dotted key path. Must track the structs in `vibrascope_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        "network",
        "network.ingest_addr",
        "network.feed_addr",
        "network.http_addr",
        "buffer",
        "buffer.capacity",
        "buffer.feed_backlog",
        "analysis",
        "analysis.sampling_rate",
        "analysis.wavelet",
        "analysis.levels",
        "analysis.axis",
        "fetch",
        "fetch.endpoint",
        "fetch.target_count",
        "fetch.timeout_ms",
    ]
    .into_iter()
    .collect()
}

/// Collect dotted key paths from a TOML tree.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

/// Warn about keys that serde would silently ignore.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new(); // parse errors are reported by serde later
    };

    let known = known_config_keys();
    let mut warnings: Vec<ValidationWarning> = walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect();
    warnings.sort_by(|a, b| a.field.cmp(&b.field));
    warnings
}

/// Range and consistency checks. Returns every violation found.
pub fn validate_ranges(config: &VibrascopeConfig) -> Vec<String> {
    let mut errors = Vec::new();

    for (name, addr) in [
        ("network.ingest_addr", &config.network.ingest_addr),
        ("network.feed_addr", &config.network.feed_addr),
        ("network.http_addr", &config.network.http_addr),
    ] {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(format!("{name} '{addr}' is not a valid IP:PORT socket address"));
        }
    }

    if config.buffer.capacity == 0 {
        errors.push("buffer.capacity must be at least 1".to_string());
    }
    if config.buffer.feed_backlog > config.buffer.capacity {
        errors.push(format!(
            "buffer.feed_backlog ({}) exceeds buffer.capacity ({})",
            config.buffer.feed_backlog, config.buffer.capacity
        ));
    }

    let rate = config.analysis.sampling_rate;
    if !(rate.is_finite() && rate > 0.0) {
        errors.push(format!("analysis.sampling_rate must be positive, got {rate}"));
    }
    if WaveletFamily::from_name(&config.analysis.wavelet).is_none() {
        errors.push(format!(
            "analysis.wavelet '{}' is not supported (expected one of: {})",
            config.analysis.wavelet,
            WaveletFamily::NAMES.join(", ")
        ));
    }
    if config.analysis.levels == 0 {
        errors.push("analysis.levels must be at least 1".to_string());
    }

    if config.fetch.endpoint.rsplit_once(':').map_or(true, |(host, port)| {
        host.is_empty() || port.parse::<u16>().is_err()
    }) {
        errors.push(format!(
            "fetch.endpoint '{}' must be HOST:PORT",
            config.fetch.endpoint
        ));
    }
    if config.fetch.target_count == 0 {
        errors.push("fetch.target_count must be at least 1".to_string());
    }
    if config.fetch.timeout_ms == 0 {
        errors.push("fetch.timeout_ms must be at least 1".to_string());
    }

    errors
}
