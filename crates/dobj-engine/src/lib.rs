//! Lifecycle engine for dobj.
//!
//! The engine resolves a resource URI into `container/key`, classifies it
//! against the blob store, and enforces the preconditions of each operation
//! before touching any data.
//!
//! # Operations
//!
//! | Operation | Accepts | Fails with |
//! |-----------|---------|------------|
//! | `create`  | `Absent` | `AlreadyExists` otherwise |
//! | `read`    | `Leaf` | `NotFound`, `NotAnObject` |
//! | `update`  | `Leaf` | `NotFound`, `NotAnObject` |
//! | `delete`  | `Leaf`, or any aggregate with `recursive` | `NotFound`, `CollectionRequiresRecursive` |
//! | `publish` | `Leaf` | `NotFound`, `NotAnObject`, `InvalidTtl` |
//! | `exists`  | anything | never on classification |
//!
//! Collections are inferred from key prefixes; the engine never writes
//! folder markers.

mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod payload;

pub use classifier::classify;
pub use config::EngineConfig;
pub use engine::{DataObjectEngine, DeleteReport};
pub use error::{EngineError, EngineResult};
pub use payload::Payload;
