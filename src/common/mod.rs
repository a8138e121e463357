//! Common types shared across replikv

pub mod config;
pub mod error;
pub mod storage;

pub use config::{CommitLevel, CoordinatorConfig, ReplicationStrategy};
pub use error::{Error, Result};
pub use storage::{EventStore, MemoryStore};
