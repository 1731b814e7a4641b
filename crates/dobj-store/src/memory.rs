use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::names::{validate_container_name, validate_key};
use crate::presign::LinkSigner;
use crate::traits::{page_of, poisoned, BlobStore, ListPage};

type Container = BTreeMap<String, Vec<u8>>;

/// In-memory, `BTreeMap`-based blob store.
///
/// Intended for tests and embedding. Containers map to ordered key maps held
/// behind a single `RwLock`. Bytes are copied on read and write.
pub struct InMemoryBlobStore {
    containers: RwLock<BTreeMap<String, Container>>,
    signer: LinkSigner,
}

impl InMemoryBlobStore {
    /// Create a new empty store whose links point at a local placeholder URL.
    pub fn new() -> Self {
        Self::with_signer(LinkSigner::random("memory://dobj"))
    }

    /// Create a new empty store that presigns with `signer`.
    pub fn with_signer(signer: LinkSigner) -> Self {
        Self {
            containers: RwLock::new(BTreeMap::new()),
            signer,
        }
    }

    /// Number of objects across all containers.
    pub fn object_count(&self) -> usize {
        self.containers
            .read()
            .map(|map| map.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Sorted names of all containers.
    pub fn container_names(&self) -> Vec<String> {
        self.containers
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn container_exists(&self, container: &str) -> StoreResult<bool> {
        let map = self.containers.read().map_err(poisoned)?;
        Ok(map.contains_key(container))
    }

    fn list_page(
        &self,
        container: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> StoreResult<ListPage> {
        let map = self.containers.read().map_err(poisoned)?;
        let objects = map
            .get(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))?;
        Ok(page_of(objects.keys().map(String::as_str), prefix, start_after, max_keys))
    }

    fn object_exists(&self, container: &str, key: &str) -> StoreResult<bool> {
        let map = self.containers.read().map_err(poisoned)?;
        Ok(map.get(container).is_some_and(|objects| objects.contains_key(key)))
    }

    fn get_object(&self, container: &str, key: &str) -> StoreResult<Vec<u8>> {
        let map = self.containers.read().map_err(poisoned)?;
        map.get(container)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| StoreError::object_not_found(container, key))
    }

    fn put_object(&self, container: &str, key: &str, data: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        let mut map = self.containers.write().map_err(poisoned)?;
        let objects = map
            .get_mut(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))?;
        objects.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn delete_object(&self, container: &str, key: &str) -> StoreResult<()> {
        let mut map = self.containers.write().map_err(poisoned)?;
        if let Some(objects) = map.get_mut(container) {
            objects.remove(key);
        }
        Ok(())
    }

    fn create_container(&self, container: &str) -> StoreResult<()> {
        validate_container_name(container)?;
        let mut map = self.containers.write().map_err(poisoned)?;
        if map.contains_key(container) {
            return Err(StoreError::ContainerAlreadyExists(container.to_string()));
        }
        map.insert(container.to_string(), BTreeMap::new());
        tracing::debug!(container, "created container");
        Ok(())
    }

    fn delete_container(&self, container: &str) -> StoreResult<()> {
        let mut map = self.containers.write().map_err(poisoned)?;
        match map.get(container) {
            None => Err(StoreError::ContainerNotFound(container.to_string())),
            Some(objects) if !objects.is_empty() => {
                Err(StoreError::ContainerNotEmpty(container.to_string()))
            }
            Some(_) => {
                map.remove(container);
                tracing::debug!(container, "removed container");
                Ok(())
            }
        }
    }

    fn presign(&self, container: &str, key: &str, ttl_secs: u64) -> StoreResult<String> {
        if !self.object_exists(container, key)? {
            return Err(StoreError::object_not_found(container, key));
        }
        Ok(self.signer.sign(container, key, ttl_secs))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("containers", &self.container_names().len())
            .field("object_count", &self.object_count())
            .finish()
    }
}
