//! Write coordination
//!
//! The coordinator is responsible for:
//! - Peer membership bookkeeping (local / zone / region buckets)
//! - Replica placement (zone spread, region spread, local fill)
//! - Write fan-out and commit-level acknowledgment
//! - Fallback dispatch when replica writes fail

pub mod commit;
pub mod placement;
pub mod recovery;
pub mod server;
pub mod topology;
pub mod transport;

pub use server::Coordinator;
pub use topology::{Peer, PeerLocality, PeerTopology};
pub use transport::PeerTransport;
