use crate::error::{StoreError, StoreResult};

/// Keys requested per page by [`PrefixListing`].
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// One page of a prefix listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Matching keys in ascending order.
    pub keys: Vec<String>,
    /// `true` if more keys follow the last one in `keys`.
    pub is_truncated: bool,
}

/// Bucket+key blob store.
///
/// All implementations must satisfy these invariants:
/// - Containers are flat: a key is an opaque string, `/` has no meaning to
///   the store beyond being a character that prefixes match on.
/// - Listings are ordered by key, so paging with `start_after` is stable
///   while keys are being deleted.
/// - No method retries. Failures are returned to the caller as-is.
pub trait BlobStore: Send + Sync {
    /// Check whether a container exists.
    fn container_exists(&self, container: &str) -> StoreResult<bool>;

    /// List up to `max_keys` keys that start with `prefix` and sort strictly
    /// after `start_after`.
    ///
    /// Returns `Err(ContainerNotFound)` if the container does not exist.
    fn list_page(
        &self,
        container: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> StoreResult<ListPage>;

    /// Check whether an object is stored at exactly `key`.
    fn object_exists(&self, container: &str, key: &str) -> StoreResult<bool>;

    /// Read the bytes stored at `key`.
    ///
    /// Returns `Err(ObjectNotFound)` if nothing is stored there.
    fn get_object(&self, container: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// Store `data` at `key`, replacing any previous content.
    ///
    /// The container must already exist.
    fn put_object(&self, container: &str, key: &str, data: &[u8]) -> StoreResult<()>;

    /// Delete the object at `key`. Deleting a missing key is a no-op.
    fn delete_object(&self, container: &str, key: &str) -> StoreResult<()>;

    /// Create an empty container.
    ///
    /// Returns `Err(ContainerAlreadyExists)` if it is already there.
    fn create_container(&self, container: &str) -> StoreResult<()>;

    /// Remove an empty container.
    ///
    /// Returns `Err(ContainerNotEmpty)` while objects remain in it.
    fn delete_container(&self, container: &str) -> StoreResult<()>;

    /// Produce a URL that grants read access to `key` for `ttl_secs` seconds.
    fn presign(&self, container: &str, key: &str, ttl_secs: u64) -> StoreResult<String>;

    /// Returns `true` if at least one key starts with `prefix`.
    ///
    /// Default implementation fetches a single-key page.
    fn has_keys_with_prefix(&self, container: &str, prefix: &str) -> StoreResult<bool> {
        Ok(!self.list_page(container, prefix, None, 1)?.keys.is_empty())
    }
}

/// Lazy iterator over every key under a prefix.
///
/// Pages are fetched on demand, so a listing can be consumed while the keys
/// it yields are being deleted. A new listing starts from the beginning. The
/// iterator stops after yielding the first error.
pub struct PrefixListing<'a> {
    store: &'a dyn BlobStore,
    container: String,
    prefix: String,
    page_size: usize,
    start_after: Option<String>,
    buffer: std::vec::IntoIter<String>,
    exhausted: bool,
}

impl<'a> PrefixListing<'a> {
    pub fn new(store: &'a dyn BlobStore, container: &str, prefix: &str) -> Self {
        Self::with_page_size(store, container, prefix, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        store: &'a dyn BlobStore,
        container: &str,
        prefix: &str,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            container: container.to_string(),
            prefix: prefix.to_string(),
            page_size: page_size.max(1),
            start_after: None,
            buffer: Vec::new().into_iter(),
            exhausted: false,
        }
    }
}

impl Iterator for PrefixListing<'_> {
    type Item = StoreResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.buffer.next() {
                self.start_after = Some(key.clone());
                return Some(Ok(key));
            }
            if self.exhausted {
                return None;
            }

            match self.store.list_page(
                &self.container,
                &self.prefix,
                self.start_after.as_deref(),
                self.page_size,
            ) {
                Ok(page) => {
                    self.exhausted = !page.is_truncated || page.keys.is_empty();
                    self.buffer = page.keys.into_iter();
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl std::fmt::Debug for PrefixListing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixListing")
            .field("container", &self.container)
            .field("prefix", &self.prefix)
            .field("start_after", &self.start_after)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// Keys of `keys` that start with `prefix` and sort after `start_after`,
/// cut to one page. `keys` must already be sorted.
pub(crate) fn page_of<'k, I>(keys: I, prefix: &str, start_after: Option<&str>, max_keys: usize) -> ListPage
where
    I: IntoIterator<Item = &'k str>,
{
    let mut matching = keys
        .into_iter()
        .filter(|k| k.starts_with(prefix))
        .filter(|k| start_after.map_or(true, |after| *k > after));

    let keys: Vec<String> = matching.by_ref().take(max_keys).map(str::to_string).collect();
    let is_truncated = matching.next().is_some();
    ListPage { keys, is_truncated }
}

pub(crate) fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Backend(format!("lock poisoned: {e}"))
}
