use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use dobj_source::SourceFetcher;
use dobj_store::{BlobStore, PrefixListing, StoreError};
use dobj_types::{Classification, PublishedLink, ResourceUri};

use crate::classifier;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::payload::Payload;

/// Outcome of a successful `delete`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// What the URI denoted before the delete.
    pub classification: Classification,
    /// Objects removed from the store.
    pub objects_removed: usize,
    /// Whether the container itself was removed.
    pub container_removed: bool,
    /// Whether the URI classified as `Absent` when re-checked afterwards.
    /// Entries written concurrently with a recursive delete can leave it
    /// present.
    pub absent: bool,
}

/// The lifecycle engine.
///
/// Stateless apart from its collaborators: every operation resolves the URI,
/// classifies it against the store, and only then acts. Nothing is cached
/// between calls and no lock is held across store calls, so concurrent
/// callers see whatever consistency the store itself provides.
pub struct DataObjectEngine {
    store: Arc<dyn BlobStore>,
    fetcher: Arc<dyn SourceFetcher>,
    config: EngineConfig,
}

impl DataObjectEngine {
    pub fn new(store: Arc<dyn BlobStore>, fetcher: Arc<dyn SourceFetcher>, config: EngineConfig) -> Self {
        Self { store, fetcher, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- Operations ----

    /// Store a new object at `uri`, provisioning its container if needed.
    pub fn create(&self, uri: &str, payload: Payload) -> EngineResult<()> {
        let resource = resolve(uri)?;
        if self.classify(&resource)?.exists() {
            return Err(EngineError::AlreadyExists(resource.to_string()));
        }
        if resource.is_container() {
            return Err(EngineError::invalid_resource(uri, "an object key is required"));
        }

        let data = payload.into_bytes(self.fetcher.as_ref())?;
        self.ensure_container(&resource)?;
        self.put(&resource, &data)?;

        tracing::info!(uri = %resource, bytes = data.len(), "created object");
        Ok(())
    }

    /// Return the bytes stored at `uri`.
    pub fn read(&self, uri: &str) -> EngineResult<Vec<u8>> {
        self.read_resource(&resolve(uri)?)
    }

    /// Like `read`, for an already resolved URI. The key is used exactly as
    /// given, trailing separators included.
    pub fn read_resource(&self, resource: &ResourceUri) -> EngineResult<Vec<u8>> {
        require_leaf(resource, self.classify(resource)?)?;

        self.store
            .get_object(resource.container(), resource.key())
            .map_err(|e| EngineError::from_store(&resource.to_string(), e))
    }

    /// Replace the bytes of an existing object.
    pub fn update(&self, uri: &str, payload: Payload) -> EngineResult<()> {
        let resource = resolve(uri)?;
        require_leaf(&resource, self.classify(&resource)?)?;

        let data = payload.into_bytes(self.fetcher.as_ref())?;
        self.put(&resource, &data)?;

        tracing::info!(uri = %resource, bytes = data.len(), "updated object");
        Ok(())
    }

    /// Delete an object, or with `recursive` a collection or container and
    /// everything under it.
    pub fn delete(&self, uri: &str, recursive: bool) -> EngineResult<DeleteReport> {
        let resource = resolve(uri)?;
        let classification = self.classify(&resource)?;

        let mut report = DeleteReport {
            classification,
            objects_removed: 0,
            container_removed: false,
            absent: false,
        };

        match classification {
            Classification::Absent => return Err(EngineError::NotFound(resource.to_string())),
            Classification::Container | Classification::Collection if !recursive => {
                return Err(EngineError::CollectionRequiresRecursive(resource.to_string()));
            }
            Classification::Leaf => {
                self.delete_one(&resource, resource.key())?;
                report.objects_removed = 1;
            }
            Classification::Collection => {
                report.objects_removed = self.sweep(&resource)?;
                // The key itself may also be a stored object.
                if self.object_exists(&resource)? {
                    self.delete_one(&resource, resource.key())?;
                    report.objects_removed += 1;
                }
            }
            Classification::Container => {
                report.objects_removed = self.sweep(&resource)?;
                self.store
                    .delete_container(resource.container())
                    .map_err(|e| EngineError::from_store(&resource.to_string(), e))?;
                report.container_removed = true;
            }
        }

        report.absent = !self.classify(&resource)?.exists();
        if !report.absent {
            tracing::warn!(uri = %resource, "resource still present after delete");
        }
        tracing::info!(
            uri = %resource,
            classification = %classification,
            objects = report.objects_removed,
            "deleted"
        );
        Ok(report)
    }

    /// Issue an expiring read link for one object.
    ///
    /// `ttl_secs` defaults to the configured lifetime (1800 seconds unless
    /// overridden).
    pub fn publish(&self, uri: &str, ttl_secs: Option<u64>) -> EngineResult<PublishedLink> {
        let resource = resolve(uri)?;
        require_leaf(&resource, self.classify(&resource)?)?;

        let ttl = ttl_secs.unwrap_or(self.config.default_ttl_secs);
        if ttl == 0 || ttl > self.config.max_ttl_secs {
            return Err(EngineError::InvalidTtl {
                ttl,
                max: self.config.max_ttl_secs,
            });
        }

        let issued_at = Utc::now();
        let url = self
            .store
            .presign(resource.container(), resource.key(), ttl)
            .map_err(|e| EngineError::from_store(&resource.to_string(), e))?;

        tracing::info!(uri = %resource, ttl, "published object");
        Ok(PublishedLink::new(url, resource.container(), resource.key(), ttl, issued_at))
    }

    /// Whether anything (container, collection, or object) exists at `uri`.
    pub fn exists(&self, uri: &str) -> EngineResult<bool> {
        let resource = resolve(uri)?;
        Ok(self.classify(&resource)?.exists())
    }

    // ---- Internals ----

    fn classify(&self, resource: &ResourceUri) -> EngineResult<Classification> {
        let classification = classifier::classify(self.store.as_ref(), resource)
            .map_err(|e| EngineError::from_store(&resource.to_string(), e))?;
        tracing::debug!(uri = %resource, %classification, "classified");
        Ok(classification)
    }

    fn object_exists(&self, resource: &ResourceUri) -> EngineResult<bool> {
        self.store
            .object_exists(resource.container(), resource.key())
            .map_err(|e| EngineError::from_store(&resource.to_string(), e))
    }

    fn ensure_container(&self, resource: &ResourceUri) -> EngineResult<()> {
        let container = resource.container();
        let exists = self
            .store
            .container_exists(container)
            .map_err(|e| EngineError::from_store(&resource.to_string(), e))?;
        if exists {
            return Ok(());
        }

        match self.store.create_container(container) {
            Ok(()) => {
                tracing::info!(container, "provisioned container");
                Ok(())
            }
            // Someone else provisioned it in between.
            Err(StoreError::ContainerAlreadyExists(_)) => Ok(()),
            Err(e) => Err(EngineError::from_store(&resource.to_string(), e)),
        }
    }

    fn put(&self, resource: &ResourceUri, data: &[u8]) -> EngineResult<()> {
        self.store
            .put_object(resource.container(), resource.key(), data)
            .map_err(|e| EngineError::from_store(&resource.to_string(), e))
    }

    fn delete_one(&self, resource: &ResourceUri, key: &str) -> EngineResult<()> {
        self.store
            .delete_object(resource.container(), key)
            .map_err(|e| EngineError::from_store(&resource.to_string(), e))
    }

    /// Delete every key under the resource's collection prefix, one at a
    /// time. Every key is attempted; the first failure is returned after
    /// the sweep.
    fn sweep(&self, resource: &ResourceUri) -> EngineResult<usize> {
        let container = resource.container();
        let prefix = resource.collection_prefix();

        let mut removed = 0;
        let mut first_error: Option<StoreError> = None;

        for key in PrefixListing::new(self.store.as_ref(), container, &prefix) {
            let key = match key {
                Ok(key) => key,
                Err(e) => {
                    first_error.get_or_insert(e);
                    break;
                }
            };
            match self.store.delete_object(container, &key) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(container, key = %key, error = %e, "failed to delete entry");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(EngineError::ExternalServiceFailure(e)),
            None => Ok(removed),
        }
    }
}

impl std::fmt::Debug for DataObjectEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataObjectEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn resolve(uri: &str) -> EngineResult<ResourceUri> {
    ResourceUri::parse(uri).map_err(|e| EngineError::from_uri(uri, e))
}

fn require_leaf(resource: &ResourceUri, classification: Classification) -> EngineResult<()> {
    match classification {
        Classification::Leaf => Ok(()),
        Classification::Absent => Err(EngineError::NotFound(resource.to_string())),
        Classification::Container | Classification::Collection => {
            Err(EngineError::NotAnObject(resource.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dobj_source::InMemoryFetcher;
    use dobj_store::{FsBlobStore, InMemoryBlobStore, LinkSigner, ListPage, StoreResult};

    const CAR: &str = "https://images.example.com/car.jpg";

    fn engine_with(store: Arc<dyn BlobStore>) -> DataObjectEngine {
        let fetcher = InMemoryFetcher::new().with_source(CAR, b"car-bytes".to_vec());
        DataObjectEngine::new(store, Arc::new(fetcher), EngineConfig::default())
    }

    fn engine() -> (Arc<InMemoryBlobStore>, DataObjectEngine) {
        let store = Arc::new(InMemoryBlobStore::new());
        let engine = engine_with(store.clone());
        (store, engine)
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn create_then_read_round_trip() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(vec![1, 2, 3])).unwrap();
        assert!(engine.exists("bucket1/obj").unwrap());
        assert_eq!(engine.read("bucket1/obj").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn collection_delete_requires_recursive() {
        let (_, engine) = engine();
        engine.create("bucket1/dir/obj", Payload::content(b"x".to_vec())).unwrap();
        assert!(engine.exists("bucket1/dir").unwrap());

        let err = engine.delete("bucket1/dir", false).unwrap_err();
        assert!(matches!(err, EngineError::CollectionRequiresRecursive(_)));
        assert!(engine.exists("bucket1/dir/obj").unwrap());

        let report = engine.delete("bucket1/dir", true).unwrap();
        assert_eq!(report.classification, Classification::Collection);
        assert_eq!(report.objects_removed, 1);
        assert!(report.absent);
        assert!(!engine.exists("bucket1/dir").unwrap());
        assert!(!engine.exists("bucket1/dir/obj").unwrap());
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"x".to_vec())).unwrap();
        assert!(matches!(engine.read("bucket1/missing"), Err(EngineError::NotFound(_))));
        assert!(matches!(engine.read("nobucket/missing"), Err(EngineError::NotFound(_))));
    }

    // -----------------------------------------------------------------------
    // create
    // -----------------------------------------------------------------------

    #[test]
    fn create_provisions_container() {
        let (store, engine) = engine();
        assert!(!engine.exists("bucket1").unwrap());
        engine.create("bucket1/a/b/c", Payload::content(b"x".to_vec())).unwrap();
        assert!(store.container_exists("bucket1").unwrap());
        assert!(engine.exists("bucket1").unwrap());
        assert!(engine.exists("bucket1/a").unwrap());
        assert!(engine.exists("bucket1/a/b").unwrap());
    }

    #[test]
    fn create_never_writes_folder_markers() {
        let (store, engine) = engine();
        engine.create("bucket1/a/b/c", Payload::content(b"x".to_vec())).unwrap();
        assert_eq!(store.object_count(), 1);
    }

    #[test]
    fn create_existing_object_fails_and_keeps_content() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"first".to_vec())).unwrap();
        let err = engine.create("bucket1/obj", Payload::content(b"second".to_vec())).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyExists(_)));
        assert_eq!(engine.read("bucket1/obj").unwrap(), b"first");
    }

    #[test]
    fn create_over_collection_or_container_fails() {
        let (_, engine) = engine();
        engine.create("bucket1/dir/obj", Payload::content(b"x".to_vec())).unwrap();
        assert!(matches!(
            engine.create("bucket1/dir", Payload::content(b"y".to_vec())),
            Err(EngineError::AlreadyExists(_))
        ));
        assert!(matches!(
            engine.create("bucket1", Payload::content(b"y".to_vec())),
            Err(EngineError::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_without_key_is_invalid() {
        let (store, engine) = engine();
        let err = engine.create("fresh", Payload::content(b"y".to_vec())).unwrap_err();
        assert!(matches!(err, EngineError::InvalidResource { .. }));
        assert!(!store.container_exists("fresh").unwrap());
    }

    #[test]
    fn create_from_source() {
        let (_, engine) = engine();
        engine.create("bucket1/car.jpg", Payload::source(CAR)).unwrap();
        assert_eq!(engine.read("bucket1/car.jpg").unwrap(), b"car-bytes");
    }

    #[test]
    fn create_from_bad_sources() {
        let (store, engine) = engine();
        let err = engine.create("bucket1/x", Payload::source("not-a-url")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSource { .. }));

        let err = engine
            .create("bucket1/x", Payload::source("https://images.example.com/missing.jpg"))
            .unwrap_err();
        assert!(matches!(err, EngineError::SourceUnreachable { .. }));

        // Failed fetches leave nothing behind, not even the container.
        assert!(!store.container_exists("bucket1").unwrap());
    }

    #[test]
    fn invalid_uris_are_rejected_everywhere() {
        let (_, engine) = engine();
        for uri in ["", "/obj"] {
            assert!(matches!(engine.exists(uri), Err(EngineError::InvalidResource { .. })));
            assert!(matches!(engine.read(uri), Err(EngineError::InvalidResource { .. })));
            assert!(matches!(
                engine.create(uri, Payload::content(vec![])),
                Err(EngineError::InvalidResource { .. })
            ));
            assert!(matches!(engine.delete(uri, true), Err(EngineError::InvalidResource { .. })));
            assert!(matches!(engine.publish(uri, None), Err(EngineError::InvalidResource { .. })));
        }
    }

    #[test]
    fn container_names_refused_by_store_are_invalid_resources() {
        let (_, engine) = engine();
        let err = engine.create(".hidden/obj", Payload::content(vec![1])).unwrap_err();
        assert!(matches!(err, EngineError::InvalidResource { .. }));
    }

    // -----------------------------------------------------------------------
    // read / update
    // -----------------------------------------------------------------------

    #[test]
    fn read_aggregates_is_not_an_object() {
        let (_, engine) = engine();
        engine.create("bucket1/dir/obj", Payload::content(b"x".to_vec())).unwrap();
        assert!(matches!(engine.read("bucket1"), Err(EngineError::NotAnObject(_))));
        assert!(matches!(engine.read("bucket1/dir"), Err(EngineError::NotAnObject(_))));
        assert!(matches!(engine.read("bucket1/dir/"), Err(EngineError::NotAnObject(_))));
    }

    #[test]
    fn update_overwrites_leaf() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"old".to_vec())).unwrap();
        engine.update("bucket1/obj", Payload::content(b"new".to_vec())).unwrap();
        assert_eq!(engine.read("bucket1/obj").unwrap(), b"new");

        engine.update("bucket1/obj", Payload::source(CAR)).unwrap();
        assert_eq!(engine.read("bucket1/obj").unwrap(), b"car-bytes");
    }

    #[test]
    fn update_preconditions() {
        let (_, engine) = engine();
        engine.create("bucket1/dir/obj", Payload::content(b"x".to_vec())).unwrap();
        assert!(matches!(
            engine.update("bucket1/missing", Payload::content(vec![])),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            engine.update("bucket1/dir", Payload::content(vec![])),
            Err(EngineError::NotAnObject(_))
        ));
        assert!(matches!(
            engine.update("bucket1", Payload::content(vec![])),
            Err(EngineError::NotAnObject(_))
        ));
    }

    #[test]
    fn update_with_unreachable_source_keeps_content() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"keep".to_vec())).unwrap();
        let err = engine
            .update("bucket1/obj", Payload::source("https://nowhere.example.com/x"))
            .unwrap_err();
        assert!(matches!(err, EngineError::SourceUnreachable { .. }));
        assert_eq!(engine.read("bucket1/obj").unwrap(), b"keep");
    }

    #[test]
    fn object_that_is_also_a_prefix_is_treated_as_collection() {
        let (store, engine) = engine();
        engine.create("bucket1/dir/obj", Payload::content(b"nested".to_vec())).unwrap();
        store.put_object("bucket1", "dir", b"shadowed").unwrap();

        assert!(matches!(engine.read("bucket1/dir"), Err(EngineError::NotAnObject(_))));
        assert!(matches!(
            engine.delete("bucket1/dir", false),
            Err(EngineError::CollectionRequiresRecursive(_))
        ));
        assert!(engine.exists("bucket1/dir/obj").unwrap());

        let report = engine.delete("bucket1/dir", true).unwrap();
        assert_eq!(report.objects_removed, 2);
        assert!(report.absent);
        assert!(!store.object_exists("bucket1", "dir").unwrap());
    }

    // -----------------------------------------------------------------------
    // delete
    // -----------------------------------------------------------------------

    #[test]
    fn delete_leaf() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"x".to_vec())).unwrap();
        engine.create("bucket1/other", Payload::content(b"y".to_vec())).unwrap();

        let report = engine.delete("bucket1/obj", false).unwrap();
        assert_eq!(report.classification, Classification::Leaf);
        assert_eq!(report.objects_removed, 1);
        assert!(!engine.exists("bucket1/obj").unwrap());
        assert!(engine.exists("bucket1/other").unwrap());
        assert!(engine.exists("bucket1").unwrap());
    }

    #[test]
    fn recursive_delete_of_leaf_is_plain_delete() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"x".to_vec())).unwrap();
        let report = engine.delete("bucket1/obj", true).unwrap();
        assert_eq!(report.objects_removed, 1);
        assert!(!report.container_removed);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_, engine) = engine();
        assert!(matches!(engine.delete("bucket1/obj", true), Err(EngineError::NotFound(_))));
        assert!(matches!(engine.delete("bucket1", true), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn recursive_collection_delete_spares_siblings() {
        let (_, engine) = engine();
        for uri in ["bucket1/dir/a", "bucket1/dir/sub/b", "bucket1/dirx", "bucket1/other/c"] {
            engine.create(uri, Payload::content(uri.as_bytes().to_vec())).unwrap();
        }
        let report = engine.delete("bucket1/dir", true).unwrap();
        assert_eq!(report.objects_removed, 2);
        assert!(!engine.exists("bucket1/dir/sub").unwrap());
        assert!(engine.exists("bucket1/dirx").unwrap());
        assert!(engine.exists("bucket1/other/c").unwrap());
    }

    #[test]
    fn container_delete_requires_recursive() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"x".to_vec())).unwrap();
        assert!(matches!(
            engine.delete("bucket1", false),
            Err(EngineError::CollectionRequiresRecursive(_))
        ));
        assert!(engine.exists("bucket1/obj").unwrap());
    }

    #[test]
    fn recursive_container_delete_removes_everything() {
        let (store, engine) = engine();
        for i in 0..25 {
            engine.create(&format!("bucket1/d{}/o{i}", i % 3), Payload::content(vec![i as u8])).unwrap();
        }
        let report = engine.delete("bucket1/", true).unwrap();
        assert_eq!(report.classification, Classification::Container);
        assert_eq!(report.objects_removed, 25);
        assert!(report.container_removed);
        assert!(report.absent);
        assert!(!store.container_exists("bucket1").unwrap());
        assert!(!engine.exists("bucket1/d0/o0").unwrap());
    }

    // -----------------------------------------------------------------------
    // publish / exists
    // -----------------------------------------------------------------------

    #[test]
    fn publish_leaf_uses_default_ttl() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"x".to_vec())).unwrap();
        let link = engine.publish("bucket1/obj", None).unwrap();
        assert_eq!(link.ttl_secs, 1800);
        assert_eq!(link.container, "bucket1");
        assert_eq!(link.key, "obj");
        assert!(link.url.contains("/bucket1/obj?expires="));
        assert!(link.expires_at > Utc::now());
    }

    #[test]
    fn publish_aggregates_is_not_an_object_for_any_ttl() {
        let (_, engine) = engine();
        engine.create("bucket1/dir/obj", Payload::content(b"x".to_vec())).unwrap();
        for ttl in [None, Some(0), Some(1), Some(60), Some(u64::MAX)] {
            assert!(matches!(engine.publish("bucket1", ttl), Err(EngineError::NotAnObject(_))));
            assert!(matches!(engine.publish("bucket1/dir", ttl), Err(EngineError::NotAnObject(_))));
        }
    }

    #[test]
    fn publish_missing_is_not_found() {
        let (_, engine) = engine();
        assert!(matches!(engine.publish("bucket1/obj", Some(60)), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn publish_rejects_out_of_range_ttl() {
        let (_, engine) = engine();
        engine.create("bucket1/obj", Payload::content(b"x".to_vec())).unwrap();
        assert!(matches!(engine.publish("bucket1/obj", Some(0)), Err(EngineError::InvalidTtl { .. })));
        assert!(matches!(
            engine.publish("bucket1/obj", Some(dobj_types::MAX_TTL_SECS + 1)),
            Err(EngineError::InvalidTtl { .. })
        ));
        assert_eq!(engine.publish("bucket1/obj", Some(60)).unwrap().ttl_secs, 60);
    }

    #[test]
    fn publish_honours_configured_default() {
        let store = Arc::new(InMemoryBlobStore::new());
        let config = EngineConfig {
            default_ttl_secs: 90,
            ..EngineConfig::default()
        };
        let engine = DataObjectEngine::new(store, Arc::new(InMemoryFetcher::new()), config);
        engine.create("b/o", Payload::content(vec![1])).unwrap();
        assert_eq!(engine.publish("b/o", None).unwrap().ttl_secs, 90);
    }

    #[test]
    fn exists_does_not_distinguish_kinds() {
        let (_, engine) = engine();
        engine.create("bucket1/dir/obj", Payload::content(b"x".to_vec())).unwrap();
        assert!(engine.exists("bucket1").unwrap());
        assert!(engine.exists("bucket1/dir").unwrap());
        assert!(engine.exists("bucket1/dir/obj").unwrap());
        assert!(!engine.exists("bucket1/di").unwrap());
        assert!(!engine.exists("bucket2").unwrap());
    }

    // -----------------------------------------------------------------------
    // Failure propagation
    // -----------------------------------------------------------------------

    /// Wraps a store and fails deletes of one key and every presign.
    struct FlakyStore {
        inner: InMemoryBlobStore,
        poisoned_key: String,
    }

    impl BlobStore for FlakyStore {
        fn container_exists(&self, container: &str) -> StoreResult<bool> {
            self.inner.container_exists(container)
        }
        fn list_page(&self, c: &str, p: &str, after: Option<&str>, max: usize) -> StoreResult<ListPage> {
            self.inner.list_page(c, p, after, max)
        }
        fn object_exists(&self, c: &str, k: &str) -> StoreResult<bool> {
            self.inner.object_exists(c, k)
        }
        fn get_object(&self, c: &str, k: &str) -> StoreResult<Vec<u8>> {
            self.inner.get_object(c, k)
        }
        fn put_object(&self, c: &str, k: &str, data: &[u8]) -> StoreResult<()> {
            self.inner.put_object(c, k, data)
        }
        fn delete_object(&self, c: &str, k: &str) -> StoreResult<()> {
            if k == self.poisoned_key {
                return Err(StoreError::Backend("simulated outage".into()));
            }
            self.inner.delete_object(c, k)
        }
        fn create_container(&self, c: &str) -> StoreResult<()> {
            self.inner.create_container(c)
        }
        fn delete_container(&self, c: &str) -> StoreResult<()> {
            self.inner.delete_container(c)
        }
        fn presign(&self, _c: &str, _k: &str, _ttl: u64) -> StoreResult<String> {
            Err(StoreError::Backend("signer offline".into()))
        }
    }

    fn flaky_engine() -> DataObjectEngine {
        let store = FlakyStore {
            inner: InMemoryBlobStore::new(),
            poisoned_key: "dir/b".into(),
        };
        engine_with(Arc::new(store))
    }

    #[test]
    fn recursive_delete_is_best_effort() {
        let engine = flaky_engine();
        for uri in ["b/dir/a", "b/dir/b", "b/dir/c"] {
            engine.create(uri, Payload::content(vec![1])).unwrap();
        }
        let err = engine.delete("b/dir", true).unwrap_err();
        assert!(matches!(err, EngineError::ExternalServiceFailure(_)));

        // Entries on both sides of the failure were still attempted.
        assert!(!engine.exists("b/dir/a").unwrap());
        assert!(engine.exists("b/dir/b").unwrap());
        assert!(!engine.exists("b/dir/c").unwrap());
    }

    #[test]
    fn unclassified_store_failures_are_external() {
        let engine = flaky_engine();
        engine.create("b/obj", Payload::content(vec![1])).unwrap();
        let err = engine.publish("b/obj", None).unwrap_err();
        assert!(matches!(err, EngineError::ExternalServiceFailure(StoreError::Backend(_))));
    }

    #[test]
    fn read_resource_keeps_trailing_separator() {
        let (_, engine) = engine();
        engine.create("b/dir//", Payload::content(b"slash".to_vec())).unwrap();
        assert_eq!(engine.read("b/dir//").unwrap(), b"slash");

        let exact = ResourceUri::from_parts("b", "dir/").unwrap();
        assert_eq!(engine.read_resource(&exact).unwrap(), b"slash");

        // Stripping the separator names the enclosing collection instead.
        let stripped = ResourceUri::from_parts("b", "dir").unwrap();
        assert!(matches!(engine.read_resource(&stripped), Err(EngineError::NotAnObject(_))));
    }

    /// Reports every container missing, as if another caller provisions it
    /// between the check and the create.
    struct RacingStore {
        inner: InMemoryBlobStore,
    }

    impl BlobStore for RacingStore {
        fn container_exists(&self, _c: &str) -> StoreResult<bool> {
            Ok(false)
        }
        fn list_page(&self, c: &str, p: &str, after: Option<&str>, max: usize) -> StoreResult<ListPage> {
            self.inner.list_page(c, p, after, max)
        }
        fn object_exists(&self, c: &str, k: &str) -> StoreResult<bool> {
            self.inner.object_exists(c, k)
        }
        fn get_object(&self, c: &str, k: &str) -> StoreResult<Vec<u8>> {
            self.inner.get_object(c, k)
        }
        fn put_object(&self, c: &str, k: &str, data: &[u8]) -> StoreResult<()> {
            self.inner.put_object(c, k, data)
        }
        fn delete_object(&self, c: &str, k: &str) -> StoreResult<()> {
            self.inner.delete_object(c, k)
        }
        fn create_container(&self, c: &str) -> StoreResult<()> {
            self.inner.create_container(c)
        }
        fn delete_container(&self, c: &str) -> StoreResult<()> {
            self.inner.delete_container(c)
        }
        fn presign(&self, c: &str, k: &str, ttl: u64) -> StoreResult<String> {
            self.inner.presign(c, k, ttl)
        }
    }

    #[test]
    fn create_tolerates_concurrently_provisioned_container() {
        let inner = InMemoryBlobStore::new();
        inner.create_container("bucket1").unwrap();
        let store = Arc::new(RacingStore { inner });
        let engine = engine_with(store.clone());

        engine.create("bucket1/obj", Payload::content(b"x".to_vec())).unwrap();
        assert_eq!(store.inner.get_object("bucket1", "obj").unwrap(), b"x");
        assert!(matches!(
            store.create_container("bucket1"),
            Err(StoreError::ContainerAlreadyExists(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Filesystem backend
    // -----------------------------------------------------------------------

    #[test]
    fn lifecycle_on_filesystem_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path(), LinkSigner::random("http://localhost/v1/shared")).unwrap();
        let engine = engine_with(Arc::new(store));

        engine.create("bucket1/dir/obj", Payload::content(vec![1, 2, 3])).unwrap();
        engine.create("bucket1/top", Payload::source(CAR)).unwrap();
        assert_eq!(engine.read("bucket1/dir/obj").unwrap(), vec![1, 2, 3]);
        assert!(engine.exists("bucket1/dir").unwrap());

        let link = engine.publish("bucket1/top", Some(120)).unwrap();
        assert!(link.url.starts_with("http://localhost/v1/shared/bucket1/top?"));

        let report = engine.delete("bucket1", true).unwrap();
        assert_eq!(report.objects_removed, 2);
        assert!(report.container_removed);
        assert!(!dir.path().join("bucket1").exists());
    }

    #[test]
    fn long_nested_keys_on_filesystem_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path(), LinkSigner::random("http://localhost/v1/shared")).unwrap();
        let engine = engine_with(Arc::new(store));

        let uri = format!("bucket1/{}img.jpg", "photos/2024/".repeat(20));
        assert!(uri.len() > 200);
        engine.create(&uri, Payload::content(b"pixels".to_vec())).unwrap();
        assert_eq!(engine.read(&uri).unwrap(), b"pixels");
        assert!(engine.exists("bucket1/photos/2024").unwrap());
    }
}
