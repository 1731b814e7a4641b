//! Foundation types for dobj.
//!
//! This crate provides the small value types shared by every dobj crate: the
//! parsed form of a resource URI, the four-way classification a URI resolves
//! to, and the expiring link handed out by `publish`.
//!
//! # Key Types
//!
//! - [`ResourceUri`] -- a `container/key` address split on its first separator
//! - [`Classification`] -- Container, Collection, Leaf, or Absent
//! - [`PublishedLink`] -- a time-bounded URL granting read access to one object

pub mod classification;
pub mod error;
pub mod link;
pub mod uri;

pub use classification::Classification;
pub use error::UriError;
pub use link::{PublishedLink, DEFAULT_TTL_SECS, MAX_TTL_SECS};
pub use uri::{resolve, ResourceUri, SEPARATOR};
