//! HTTP server for dobj.
//!
//! Exposes the lifecycle engine as a small REST API under `/v1/objects` and
//! serves published links under `/v1/shared`. Engine errors map onto HTTP
//! statuses (see [`ApiError`]) with a `{"error", "message"}` JSON body.

pub mod config;
pub mod dto;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, ServiceConfig, StoreBackend, StoreConfig};
pub use error::{ApiError, ApiResult, ServerError, ServerResult};
pub use router::build_router;
pub use server::DataObjectServer;
pub use state::AppState;
