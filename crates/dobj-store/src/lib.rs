//! Blob-store port for dobj.
//!
//! This crate defines the capability the lifecycle engine consumes, a flat
//! bucket+key object service, and ships two backends for it. The store
//! knows nothing about collections or folders: it only answers questions about
//! containers and exact keys, and lists keys by prefix.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one directory per container, one file per object
//!
//! # Published links
//!
//! Both backends hand out expiring links through a [`LinkSigner`]. The same
//! signer verifies those links when they are served back.
//!
//! # Design Rules
//!
//! 1. No folder or marker object is ever written.
//! 2. Listings are ordered by key and paged with an exclusive `start_after`.
//! 3. The store never retries; every I/O error is propagated.

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod presign;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use names::{validate_container_name, validate_key};
pub use presign::{LinkConfig, LinkError, LinkSigner};
pub use traits::{BlobStore, ListPage, PrefixListing, DEFAULT_PAGE_SIZE};
