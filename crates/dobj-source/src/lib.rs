//! Source locator fetching for dobj.
//!
//! `create` and `update` accept either raw bytes or a source locator, a URL
//! the content is pulled from before it is stored. This crate provides the
//! [`SourceFetcher`] capability and its implementations:
//!
//! - [`HttpFetcher`] -- blocking HTTP(S) client with a timeout and a size cap
//! - [`InMemoryFetcher`] -- fixed locator → bytes table for tests and embedding
//!
//! Fetch failures are split into malformed locators and unreachable sources
//! so callers can report them distinctly.

pub mod error;
pub mod fetcher;
pub mod memory;

pub use error::{FetchError, FetchResult};
pub use fetcher::{FetchConfig, HttpFetcher, SourceFetcher};
pub use memory::InMemoryFetcher;
