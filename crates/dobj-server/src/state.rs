use std::sync::Arc;

use dobj_engine::DataObjectEngine;
use dobj_source::HttpFetcher;
use dobj_store::{BlobStore, FsBlobStore, InMemoryBlobStore, LinkSigner};

use crate::config::{ServiceConfig, StoreBackend};
use crate::error::ServerResult;

/// Shared handler state: the engine and the signer that validates links the
/// engine's store hands out.
#[derive(Clone, Debug)]
pub struct AppState {
    engine: Arc<DataObjectEngine>,
    signer: Arc<LinkSigner>,
}

impl AppState {
    pub fn new(engine: DataObjectEngine, signer: LinkSigner) -> Self {
        Self {
            engine: Arc::new(engine),
            signer: Arc::new(signer),
        }
    }

    /// Wire the configured store backend, the HTTP fetcher and the engine.
    pub fn from_config(config: &ServiceConfig) -> ServerResult<Self> {
        let signer = LinkSigner::from_config(&config.links)?;
        let store: Arc<dyn BlobStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(InMemoryBlobStore::with_signer(signer.clone())),
            StoreBackend::Fs => Arc::new(FsBlobStore::open(config.store.root.clone(), signer.clone())?),
        };
        let fetcher = Arc::new(HttpFetcher::new(config.source.clone()));
        let engine = DataObjectEngine::new(store, fetcher, config.engine.clone());

        tracing::debug!(backend = ?config.store.backend, "assembled engine");
        Ok(Self::new(engine, signer))
    }

    pub fn engine(&self) -> &Arc<DataObjectEngine> {
        &self.engine
    }

    pub fn signer(&self) -> &LinkSigner {
        &self.signer
    }
}
