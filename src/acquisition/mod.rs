//! Sample acquisition
//!
//! Wire decoding of sample records and the client side of the sample feed.

pub mod decoder;
pub mod fetcher;

pub use decoder::{decode, encode, DecodeError};
pub use fetcher::{fetch, fetch_from, FetchError, FetchedWindow, WindowFetcher};
