//! Peer membership registry
//!
//! Peers are partitioned into three locality buckets: local (no locality tag),
//! zone (nearby, same region), and region (remote). An external membership
//! manager drives `add_peer`/`drop_peer`; the registry itself does no
//! discovery or health checking. Identity is the peer id string, and it is
//! tracked per bucket: the same id registered under two buckets counts twice.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A replica target known to the coordinator.
///
/// Only the id is interpreted; addressing and delivery belong to the
/// `PeerTransport` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
}

impl Peer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Where a peer lives relative to the coordinator.
///
/// Zone takes precedence: if both `zone` and `region` are set, the region is
/// ignored. Neither set means a local peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerLocality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl PeerLocality {
    /// A peer with no locality tag.
    pub fn local() -> Self {
        Self::default()
    }

    /// A peer in another zone within the local region.
    pub fn zone(zone: impl Into<String>) -> Self {
        Self {
            zone: Some(zone.into()),
            region: None,
        }
    }

    /// A peer in a remote region.
    pub fn region(region: impl Into<String>) -> Self {
        Self {
            zone: None,
            region: Some(region.into()),
        }
    }
}

/// The coordinator's view of cluster membership.
///
/// `zones`/`regions` mirror the keys of `zone_map`/`region_map` and keep
/// insertion order for selection; an id appears there iff its bucket holds at
/// least one peer. `peer_count` moves only on actual insertion or removal of
/// an (id, bucket) registration. Buckets are BTreeMaps so iteration order is
/// stable, which keeps selection deterministic under a seeded rng.
#[derive(Debug, Clone, Default)]
pub struct PeerTopology {
    local: BTreeMap<String, Peer>,
    zone_map: HashMap<String, BTreeMap<String, Peer>>,
    zones: Vec<String>,
    region_map: HashMap<String, BTreeMap<String, Peer>>,
    regions: Vec<String>,
    peer_count: usize,
}

impl PeerTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer under the bucket named by `locality`.
    ///
    /// Re-adding an id already present in that bucket is a no-op.
    pub fn add_peer(&mut self, peer: Peer, locality: &PeerLocality) {
        if let Some(zone) = &locality.zone {
            // zone wins over region
            let bucket = self.zone_map.entry(zone.clone()).or_default();
            if bucket.is_empty() {
                self.zones.push(zone.clone());
            }
            if !bucket.contains_key(&peer.id) {
                bucket.insert(peer.id.clone(), peer);
                self.peer_count += 1;
            }
            return;
        }

        if let Some(region) = &locality.region {
            let bucket = self.region_map.entry(region.clone()).or_default();
            if bucket.is_empty() {
                self.regions.push(region.clone());
            }
            if !bucket.contains_key(&peer.id) {
                bucket.insert(peer.id.clone(), peer);
                self.peer_count += 1;
            }
            return;
        }

        if !self.local.contains_key(&peer.id) {
            self.local.insert(peer.id.clone(), peer);
            self.peer_count += 1;
        }
    }

    /// Remove a peer from the bucket named by `locality`.
    ///
    /// Dropping an unknown peer, or from an unknown zone/region, is a no-op.
    /// A zone/region whose bucket empties is forgotten entirely.
    pub fn drop_peer(&mut self, id: &str, locality: &PeerLocality) {
        if let Some(zone) = &locality.zone {
            if let Some(bucket) = self.zone_map.get_mut(zone) {
                if bucket.remove(id).is_some() {
                    self.peer_count -= 1;
                }
                if bucket.is_empty() {
                    self.zone_map.remove(zone);
                    self.zones.retain(|z| z != zone);
                }
            }
            return;
        }

        if let Some(region) = &locality.region {
            if let Some(bucket) = self.region_map.get_mut(region) {
                if bucket.remove(id).is_some() {
                    self.peer_count -= 1;
                }
                if bucket.is_empty() {
                    self.region_map.remove(region);
                    self.regions.retain(|r| r != region);
                }
            }
            return;
        }

        if self.local.remove(id).is_some() {
            self.peer_count -= 1;
        }
    }

    /// Number of (peer id, bucket) registrations currently known.
    pub fn peer_count(&self) -> usize {
        self.peer_count
    }

    /// Known zone ids, in insertion order.
    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    /// Known region ids, in insertion order.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn zone_peers(&self, zone: &str) -> Option<&BTreeMap<String, Peer>> {
        self.zone_map.get(zone)
    }

    pub fn region_peers(&self, region: &str) -> Option<&BTreeMap<String, Peer>> {
        self.region_map.get(region)
    }

    pub fn local_peers(&self) -> &BTreeMap<String, Peer> {
        &self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_local_peer() {
        let mut topology = PeerTopology::new();
        topology.add_peer(Peer::new("p1"), &PeerLocality::local());
        assert_eq!(topology.peer_count(), 1);
        assert!(topology.local_peers().contains_key("p1"));
        assert!(topology.zones().is_empty());
        assert!(topology.regions().is_empty());
    }

    #[test]
    fn test_re_add_is_noop_on_count() {
        let mut topology = PeerTopology::new();
        topology.add_peer(Peer::new("p1"), &PeerLocality::zone("z1"));
        topology.add_peer(Peer::new("p1"), &PeerLocality::zone("z1"));
        assert_eq!(topology.peer_count(), 1);
        assert_eq!(topology.zones(), &["z1".to_string()]);
    }

    #[test]
    fn test_zone_takes_precedence_over_region() {
        let mut topology = PeerTopology::new();
        let both = PeerLocality {
            zone: Some("z1".into()),
            region: Some("r1".into()),
        };
        topology.add_peer(Peer::new("p1"), &both);
        assert_eq!(topology.peer_count(), 1);
        assert!(topology.zone_peers("z1").unwrap().contains_key("p1"));
        assert!(topology.region_peers("r1").is_none());

        // drop honors the same precedence: the region part is ignored
        topology.drop_peer("p1", &PeerLocality::region("r1"));
        assert_eq!(topology.peer_count(), 1);
        topology.drop_peer("p1", &both);
        assert_eq!(topology.peer_count(), 0);
    }

    #[test]
    fn test_same_id_in_two_buckets_counts_twice() {
        let mut topology = PeerTopology::new();
        topology.add_peer(Peer::new("p1"), &PeerLocality::zone("z1"));
        topology.add_peer(Peer::new("p1"), &PeerLocality::region("r1"));
        topology.add_peer(Peer::new("p1"), &PeerLocality::local());
        assert_eq!(topology.peer_count(), 3);
    }

    #[test]
    fn test_drop_unknown_is_noop() {
        let mut topology = PeerTopology::new();
        topology.add_peer(Peer::new("p1"), &PeerLocality::zone("z1"));

        topology.drop_peer("nope", &PeerLocality::local());
        topology.drop_peer("p1", &PeerLocality::zone("no-such-zone"));
        topology.drop_peer("p1", &PeerLocality::region("no-such-region"));
        assert_eq!(topology.peer_count(), 1);
        assert_eq!(topology.zones(), &["z1".to_string()]);
    }

    #[test]
    fn test_empty_zone_is_forgotten() {
        let mut topology = PeerTopology::new();
        topology.add_peer(Peer::new("p1"), &PeerLocality::zone("z1"));
        topology.add_peer(Peer::new("p2"), &PeerLocality::zone("z1"));
        topology.add_peer(Peer::new("p3"), &PeerLocality::zone("z2"));

        topology.drop_peer("p1", &PeerLocality::zone("z1"));
        assert_eq!(topology.zones(), &["z1".to_string(), "z2".to_string()]);

        topology.drop_peer("p2", &PeerLocality::zone("z1"));
        assert_eq!(topology.zones(), &["z2".to_string()]);
        assert!(topology.zone_peers("z1").is_none());
        assert_eq!(topology.peer_count(), 1);
    }

    #[test]
    fn test_empty_region_is_forgotten() {
        let mut topology = PeerTopology::new();
        topology.add_peer(Peer::new("p1"), &PeerLocality::region("r1"));
        topology.drop_peer("p1", &PeerLocality::region("r1"));
        assert!(topology.regions().is_empty());
        assert!(topology.region_peers("r1").is_none());
        assert_eq!(topology.peer_count(), 0);
    }

    #[test]
    fn test_count_tracks_registrations() {
        let mut topology = PeerTopology::new();
        for i in 0..4 {
            topology.add_peer(Peer::new(format!("p{}", i)), &PeerLocality::local());
        }
        topology.add_peer(Peer::new("z-a"), &PeerLocality::zone("z1"));
        topology.add_peer(Peer::new("z-b"), &PeerLocality::zone("z2"));
        topology.add_peer(Peer::new("r-a"), &PeerLocality::region("r1"));
        assert_eq!(topology.peer_count(), 7);

        topology.drop_peer("p0", &PeerLocality::local());
        topology.drop_peer("z-a", &PeerLocality::zone("z1"));
        assert_eq!(topology.peer_count(), 5);
    }
}
