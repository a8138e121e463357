//! # replikv
//!
//! The write-coordination core of a distributed key/value event store:
//! - Topology-aware replica placement (local / zone / region)
//! - Concurrent write fan-out with ONE / QUORUM / ALL commit levels
//! - Fallback dispatch that retries untried peers after any write failure
//! - Pluggable storage and transport behind async traits
//!
//! ## Architecture
//!
//! ```text
//! put(key, event)
//!     │
//! ┌───▼──────────────────────────────────────┐
//! │ Coordinator                              │
//! │  - PeerTopology (local/zone/region)      │
//! │  - placement: plan the initial wave      │
//! │  - per-put driver task:                  │
//! │      CommitTracker + fallback queue      │
//! └───┬───────────────┬──────────────────────┘
//!     │ EventStore    │ PeerTransport
//! ┌───▼────────┐  ┌───▼──────────────────────┐
//! │ local      │  │ peer replicas            │
//! │ replica    │  │ (zones, regions, local)  │
//! └────────────┘  └──────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use replikv::{Coordinator, CoordinatorConfig, MemoryStore, Peer, PeerLocality, PeerTransport};
//!
//! struct NoopTransport;
//!
//! #[async_trait]
//! impl PeerTransport for NoopTransport {
//!     async fn replicate(&self, _peer: &Peer, _key: &str, _event: Bytes) -> replikv::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> replikv::Result<()> {
//!     let coordinator = Coordinator::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(NoopTransport),
//!         CoordinatorConfig::default(),
//!     )?;
//!
//!     coordinator.add_peer(Peer::new("peer-1"), PeerLocality::zone("zone-a"));
//!     coordinator.put("my-key", Bytes::from_static(b"event")).await?;
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod coordinator;

// Re-export commonly used types
pub use common::{
    CommitLevel, CoordinatorConfig, Error, EventStore, MemoryStore, ReplicationStrategy, Result,
};
pub use coordinator::{Coordinator, Peer, PeerLocality, PeerTopology, PeerTransport};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
