//! Initial-wave replica placement
//!
//! Given a topology snapshot, a replication strategy, and a dispatch budget,
//! the planner selects the peers for the first wave of replica writes. The
//! local write is not planned here; the caller always issues it first and
//! passes the leftover budget (replication factor minus one) in.
//!
//! Phase order: other-zone replicas, then other-region replicas, then fill
//! from local peers. Every draw is random without replacement, an id is never
//! selected twice even when it is registered in several buckets, and each
//! phase stops the moment the budget runs out. A wave may come back short of
//! the budget; the caller then falls through to fallback dispatch.

use crate::coordinator::topology::{Peer, PeerTopology};
use crate::ReplicationStrategy;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

/// Select the peers for one put's initial wave of replica writes.
pub fn plan_initial_wave<R: Rng>(
    topology: &PeerTopology,
    strategy: &ReplicationStrategy,
    budget: usize,
    rng: &mut R,
) -> Vec<Peer> {
    let mut wave = Vec::new();
    let mut chosen: HashSet<String> = HashSet::new();
    let mut budget = budget;
    if budget == 0 {
        return wave;
    }

    select_tier(
        topology.zones(),
        |z| topology.zone_peers(z),
        strategy.other_zone_replicas,
        &mut budget,
        &mut chosen,
        &mut wave,
        rng,
    );

    select_tier(
        topology.regions(),
        |r| topology.region_peers(r),
        strategy.other_region_replicas,
        &mut budget,
        &mut chosen,
        &mut wave,
        rng,
    );

    // fill whatever is left from the local bucket
    let mut ids: Vec<&String> = topology
        .local_peers()
        .keys()
        .filter(|id| !chosen.contains(id.as_str()))
        .collect();
    while budget > 0 && !ids.is_empty() {
        let id = ids.remove(rng.gen_range(0..ids.len()));
        if let Some(peer) = topology.local_peers().get(id) {
            chosen.insert(id.clone());
            wave.push(peer.clone());
            budget -= 1;
        }
    }

    wave
}

/// One locality tier (zones or regions) of the placement policy.
///
/// `requested == groups`: one random peer from every group. `requested <
/// groups`: that many distinct groups at random, one random peer from each.
/// `requested > groups`: one per group first, then random draws from the
/// pooled remainder of the tier until the request, the budget, or the pool
/// runs out.
fn select_tier<'a, R: Rng>(
    groups: &'a [String],
    peers_of: impl Fn(&str) -> Option<&'a BTreeMap<String, Peer>>,
    requested: usize,
    budget: &mut usize,
    chosen: &mut HashSet<String>,
    wave: &mut Vec<Peer>,
    rng: &mut R,
) {
    if requested == 0 || *budget == 0 || groups.is_empty() {
        return;
    }
    let mut remaining = requested;

    if requested >= groups.len() {
        // spread across every group first
        for group in groups {
            if *budget == 0 || remaining == 0 {
                return;
            }
            if let Some(peers) = peers_of(group) {
                if let Some(peer) = pick_one(peers, chosen, rng) {
                    wave.push(peer);
                    *budget -= 1;
                    remaining -= 1;
                }
            }
        }

        // then draw the rest from the tier-wide pool
        let mut pool: Vec<&Peer> = groups
            .iter()
            .filter_map(|g| peers_of(g))
            .flat_map(|peers| peers.values())
            .filter(|p| !chosen.contains(&p.id))
            .collect();
        while remaining > 0 && *budget > 0 && !pool.is_empty() {
            let peer = pool.remove(rng.gen_range(0..pool.len()));
            chosen.insert(peer.id.clone());
            wave.push(peer.clone());
            *budget -= 1;
            remaining -= 1;
        }
    } else {
        // fewer replicas than groups: pick distinct groups at random
        let mut candidates: Vec<&String> = groups.iter().collect();
        while remaining > 0 && *budget > 0 && !candidates.is_empty() {
            let group = candidates.remove(rng.gen_range(0..candidates.len()));
            if let Some(peers) = peers_of(group) {
                if let Some(peer) = pick_one(peers, chosen, rng) {
                    wave.push(peer);
                    *budget -= 1;
                    remaining -= 1;
                }
            }
        }
    }
}

fn pick_one<R: Rng>(
    peers: &BTreeMap<String, Peer>,
    chosen: &mut HashSet<String>,
    rng: &mut R,
) -> Option<Peer> {
    let ids: Vec<&String> = peers
        .keys()
        .filter(|id| !chosen.contains(id.as_str()))
        .collect();
    if ids.is_empty() {
        return None;
    }
    let id = ids[rng.gen_range(0..ids.len())];
    chosen.insert(id.clone());
    peers.get(id).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::topology::PeerLocality;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn topology(
        local: &[&str],
        zones: &[(&str, &[&str])],
        regions: &[(&str, &[&str])],
    ) -> PeerTopology {
        let mut t = PeerTopology::new();
        for id in local {
            t.add_peer(Peer::new(*id), &PeerLocality::local());
        }
        for (zone, peers) in zones {
            for id in *peers {
                t.add_peer(Peer::new(*id), &PeerLocality::zone(*zone));
            }
        }
        for (region, peers) in regions {
            for id in *peers {
                t.add_peer(Peer::new(*id), &PeerLocality::region(*region));
            }
        }
        t
    }

    fn strategy(zone: usize, region: usize) -> ReplicationStrategy {
        ReplicationStrategy {
            other_zone_replicas: zone,
            other_region_replicas: region,
        }
    }

    fn ids(wave: &[Peer]) -> Vec<&str> {
        wave.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_zero_budget_plans_nothing() {
        let t = topology(&["l1"], &[("z1", &["a"][..])], &[][..]);
        let mut rng = StdRng::seed_from_u64(1);
        let wave = plan_initial_wave(&t, &strategy(1, 0), 0, &mut rng);
        assert!(wave.is_empty());
    }

    #[test]
    fn test_spread_one_per_zone() {
        let t = topology(
            &[],
            &[("z1", &["a1", "a2"][..]), ("z2", &["b1", "b2"][..]), ("z3", &["c1"][..])],
            &[],
        );
        let mut rng = StdRng::seed_from_u64(7);
        let wave = plan_initial_wave(&t, &strategy(3, 0), 5, &mut rng);
        assert_eq!(wave.len(), 3);
        let picked = ids(&wave);
        assert!(picked[0].starts_with('a'));
        assert!(picked[1].starts_with('b'));
        assert!(picked[2].starts_with('c'));
    }

    #[test]
    fn test_fewer_than_zone_count_picks_distinct_zones() {
        let t = topology(
            &[],
            &[("z1", &["a1"][..]), ("z2", &["b1"][..]), ("z3", &["c1"][..]), ("z4", &["d1"][..])],
            &[],
        );
        let mut rng = StdRng::seed_from_u64(42);
        let wave = plan_initial_wave(&t, &strategy(2, 0), 4, &mut rng);
        assert_eq!(wave.len(), 2);
        let picked = ids(&wave);
        assert_ne!(picked[0], picked[1]);
    }

    #[test]
    fn test_over_request_falls_through_to_pool() {
        let t = topology(&[], &[("z1", &["a1", "a2", "a3"][..]), ("z2", &["b1"][..])], &[][..]);
        let mut rng = StdRng::seed_from_u64(3);
        // 4 zone replicas requested from 2 zones holding 4 peers total
        let wave = plan_initial_wave(&t, &strategy(4, 0), 10, &mut rng);
        let mut picked = ids(&wave);
        picked.sort_unstable();
        assert_eq!(picked, vec!["a1", "a2", "a3", "b1"]);
    }

    #[test]
    fn test_over_request_beyond_pool_comes_back_short() {
        let t = topology(&[], &[("z1", &["a1", "a2"][..])], &[][..]);
        let mut rng = StdRng::seed_from_u64(3);
        let wave = plan_initial_wave(&t, &strategy(5, 0), 10, &mut rng);
        assert_eq!(wave.len(), 2);
    }

    #[test]
    fn test_budget_caps_every_phase() {
        let t = topology(
            &["l1", "l2"],
            &[("z1", &["a1"][..]), ("z2", &["b1"][..])],
            &[("r1", &["x1"][..])],
        );
        let mut rng = StdRng::seed_from_u64(9);
        let wave = plan_initial_wave(&t, &strategy(2, 1), 1, &mut rng);
        assert_eq!(wave.len(), 1);
        assert!(["a1", "b1"].contains(&wave[0].id.as_str()));
    }

    #[test]
    fn test_zone_then_region_then_local_order() {
        let t = topology(
            &["l1"],
            &[("z1", &["a1"][..])],
            &[("r1", &["x1"][..])],
        );
        let mut rng = StdRng::seed_from_u64(5);
        let wave = plan_initial_wave(&t, &strategy(1, 1), 3, &mut rng);
        assert_eq!(ids(&wave), vec!["a1", "x1", "l1"]);
    }

    #[test]
    fn test_region_phase_mirrors_zone_policy() {
        let t = topology(
            &[],
            &[],
            &[("r1", &["x1"][..]), ("r2", &["y1"][..]), ("r3", &["w1"][..])],
        );
        let mut rng = StdRng::seed_from_u64(11);
        let wave = plan_initial_wave(&t, &strategy(0, 3), 5, &mut rng);
        assert_eq!(ids(&wave), vec!["x1", "y1", "w1"]);
    }

    #[test]
    fn test_id_in_two_buckets_selected_once() {
        // "dup" is registered both in a zone and locally
        let t = topology(&["dup"], &[("z1", &["dup"][..])], &[][..]);
        let mut rng = StdRng::seed_from_u64(2);
        let wave = plan_initial_wave(&t, &strategy(1, 0), 5, &mut rng);
        assert_eq!(ids(&wave), vec!["dup"]);
    }

    #[test]
    fn test_local_fill_without_replacement() {
        let t = topology(&["l1", "l2", "l3"], &[], &[][..]);
        let mut rng = StdRng::seed_from_u64(13);
        let wave = plan_initial_wave(&t, &strategy(0, 0), 3, &mut rng);
        let mut picked = ids(&wave);
        picked.sort_unstable();
        assert_eq!(picked, vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn test_deterministic_under_seed() {
        let t = topology(
            &["l1", "l2", "l3"],
            &[("z1", &["a1", "a2"][..]), ("z2", &["b1", "b2"][..])],
            &[("r1", &["x1", "x2"][..])],
        );
        let wave_a = plan_initial_wave(
            &t,
            &strategy(2, 1),
            5,
            &mut StdRng::seed_from_u64(99),
        );
        let wave_b = plan_initial_wave(
            &t,
            &strategy(2, 1),
            5,
            &mut StdRng::seed_from_u64(99),
        );
        assert_eq!(ids(&wave_a), ids(&wave_b));
    }
}
