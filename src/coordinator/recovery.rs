//! Fallback peer queue for failure recovery
//!
//! Built lazily the first time a dispatched write fails: every peer the
//! operation has not tried yet, zone peers first, then region peers, then
//! local peers. The driver dequeues replacements from it until the
//! replication factor's worth of writes has been started or the queue runs
//! dry.

use crate::coordinator::topology::{Peer, PeerTopology};
use std::collections::{HashSet, VecDeque};

/// Every untried peer in the topology snapshot, in recovery priority order.
///
/// An id registered in several buckets is queued once.
pub fn build_fallback_queue(topology: &PeerTopology, tried: &HashSet<String>) -> VecDeque<Peer> {
    let mut queue = VecDeque::new();
    let mut seen: HashSet<String> = tried.clone();

    for zone in topology.zones() {
        if let Some(peers) = topology.zone_peers(zone) {
            for peer in peers.values() {
                if seen.insert(peer.id.clone()) {
                    queue.push_back(peer.clone());
                }
            }
        }
    }
    for region in topology.regions() {
        if let Some(peers) = topology.region_peers(region) {
            for peer in peers.values() {
                if seen.insert(peer.id.clone()) {
                    queue.push_back(peer.clone());
                }
            }
        }
    }
    for peer in topology.local_peers().values() {
        if seen.insert(peer.id.clone()) {
            queue.push_back(peer.clone());
        }
    }

    queue
}
