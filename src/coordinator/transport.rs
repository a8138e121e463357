//! Outbound replication seam
//!
//! The coordinator never talks to the network itself: every remote replica
//! write goes through `PeerTransport`. An implementation must deliver the
//! event to the peer and resolve exactly once with the outcome; the
//! coordinator places no bound on how long that takes and never cancels a
//! dispatched write.

use crate::common::Result;
use crate::coordinator::topology::Peer;
use async_trait::async_trait;
use bytes::Bytes;

/// Trait for delivering replica writes to remote peers
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn replicate(&self, peer: &Peer, key: &str, event: Bytes) -> Result<()>;
}
