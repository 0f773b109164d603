//! Collector Configuration Module
//!
//! Listener addresses, buffer sizing, analysis parameters and fetch settings,
//! loaded from TOML with built-in defaults.
//!
//! ## Loading Order
//!
//! 1. `VIBRASCOPE_CONFIG` environment variable (path to TOML file)
//! 2. `vibrascope.toml` in the current working directory
//! 3. Built-in defaults ([`defaults`])
//!
//! The loaded config is passed explicitly to whatever needs it; there is no
//! process-wide instance.
//!
//! ```ignore
//! let config = VibrascopeConfig::load();
//! let buffer = Arc::new(WindowBuffer::new(config.buffer.capacity));
//! ```

pub mod defaults;
pub mod validation;
mod vibrascope_config;

pub use vibrascope_config::*;
