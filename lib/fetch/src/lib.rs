//! HTTP fetch seam for the geckota OTA engine.
//!
//! The engine never talks to reqwest directly: it depends on the
//! [`Fetcher`] trait and receives a concrete transport at construction.
//! [`HttpFetcher`] is the batteries-included implementation.

pub mod error;
pub mod http;
pub mod traits;

pub use error::FetchError;
pub use http::HttpFetcher;
pub use traits::Fetcher;
