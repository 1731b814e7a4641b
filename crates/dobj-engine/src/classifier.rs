//! Four-way classification of a resolved URI against the blob store.
//!
//! The checks run in a fixed order and stop at the first match:
//!
//! 1. container missing → `Absent`
//! 2. empty key → `Container`
//! 3. at least one key under `key/` → `Collection`
//! 4. object stored at exactly `key` → `Leaf`
//! 5. otherwise → `Absent`
//!
//! A key that is both a stored object and the prefix of other keys is a
//! `Collection`, so single-object operations never touch its descendants.

use dobj_store::{BlobStore, StoreResult};
use dobj_types::{Classification, ResourceUri};

pub fn classify(store: &dyn BlobStore, uri: &ResourceUri) -> StoreResult<Classification> {
    if !store.container_exists(uri.container())? {
        return Ok(Classification::Absent);
    }

    if uri.is_container() {
        return Ok(Classification::Container);
    }

    if store.has_keys_with_prefix(uri.container(), &uri.collection_prefix())? {
        return Ok(Classification::Collection);
    }

    if store.object_exists(uri.container(), uri.key())? {
        return Ok(Classification::Leaf);
    }

    Ok(Classification::Absent)
}
