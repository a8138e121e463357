//! Coordinator: the public write-coordination surface
//!
//! `put` fans a key/event out to the local store plus the peers chosen by the
//! placement planner, then resolves once the commit level is satisfied. All
//! per-operation state lives in a `PutDriver` spawned for that call: replica
//! writes send their outcomes into the driver's channel, and the driver is
//! the only task that touches the operation's counters, so completions are
//! processed one at a time without locks. Concurrent puts share nothing.

use crate::common::{CommitLevel, CoordinatorConfig, EventStore, Result};
use crate::coordinator::commit::CommitTracker;
use crate::coordinator::placement::plan_initial_wave;
use crate::coordinator::recovery::build_fallback_queue;
use crate::coordinator::topology::{Peer, PeerLocality, PeerTopology};
use crate::coordinator::transport::PeerTransport;
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

pub struct Coordinator {
    storage: Arc<dyn EventStore>,
    transport: Arc<dyn PeerTransport>,
    config: CoordinatorConfig,
    topology: Mutex<PeerTopology>,
    rng: Mutex<StdRng>,
}

impl Coordinator {
    pub fn new(
        storage: Arc<dyn EventStore>,
        transport: Arc<dyn PeerTransport>,
        config: CoordinatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            storage,
            transport,
            config,
            topology: Mutex::new(PeerTopology::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Like `new`, but with deterministic replica selection.
    pub fn with_rng_seed(
        storage: Arc<dyn EventStore>,
        transport: Arc<dyn PeerTransport>,
        config: CoordinatorConfig,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            storage,
            transport,
            config,
            topology: Mutex::new(PeerTopology::new()),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    /// Register a peer. Zone takes precedence if the locality names both a
    /// zone and a region.
    pub fn add_peer(&self, peer: Peer, locality: PeerLocality) {
        tracing::debug!("adding peer {} ({:?})", peer.id, locality);
        self.topology.lock().unwrap().add_peer(peer, &locality);
    }

    /// Remove a peer. Dropping an unknown peer or locality is a no-op.
    pub fn drop_peer(&self, id: &str, locality: &PeerLocality) {
        tracing::debug!("dropping peer {} ({:?})", id, locality);
        self.topology.lock().unwrap().drop_peer(id, locality);
    }

    /// Number of (peer id, locality bucket) registrations currently known.
    pub fn peer_count(&self) -> usize {
        self.topology.lock().unwrap().peer_count()
    }

    /// Write `event` under `key` at the instance commit level.
    pub async fn put(&self, key: &str, event: Bytes) -> Result<()> {
        self.put_with_commit_level(key, event, self.config.commit_level)
            .await
    }

    /// Write `event` under `key`, overriding the commit level for this call.
    ///
    /// Resolves `Ok` once enough replica writes succeeded for `commit_level`,
    /// or with `Error::ReplicationShortfall` once every known peer has been
    /// tried and the replication factor is still out of reach. Writes beyond
    /// the commit threshold keep running after this returns; none are ever
    /// cancelled.
    pub async fn put_with_commit_level(
        &self,
        key: &str,
        event: Bytes,
        commit_level: CommitLevel,
    ) -> Result<()> {
        let replication_factor = self.config.replication_factor;
        let topology = self.topology.lock().unwrap().clone();

        // enough machines for the replication factor? (+1 is the local write)
        let available = topology.peer_count();
        if available + 1 < replication_factor {
            return Err(crate::Error::InsufficientPeers {
                required: replication_factor,
                available,
            });
        }

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = oneshot::channel();
        let mut driver = PutDriver {
            key: key.to_string(),
            event,
            storage: Arc::clone(&self.storage),
            transport: Arc::clone(&self.transport),
            topology,
            tracker: CommitTracker::new(commit_level, replication_factor),
            replication_factor,
            remaining_to_start: replication_factor,
            tried: HashSet::new(),
            fallback: None,
            outstanding: 0,
            completions: completions_tx,
            ack: Some(ack_tx),
        };

        // always write a local replica first
        driver.dispatch_local();

        if driver.remaining_to_start > 0 {
            let wave = {
                let mut rng = self.rng.lock().unwrap();
                plan_initial_wave(
                    &driver.topology,
                    &self.config.replication_strategy,
                    driver.remaining_to_start,
                    &mut *rng,
                )
            };
            for peer in wave {
                driver.dispatch_peer(peer);
            }
            if driver.remaining_to_start > 0 {
                // placement had nothing left to offer, try every untried peer
                driver.run_fallback();
            }
        }

        tokio::spawn(driver.run(completions_rx));

        ack_rx
            .await
            .map_err(|_| crate::Error::Internal("put driver exited without acknowledging".into()))?
    }
}

/// Outcome of one replica write, as seen by the driver.
struct Completion {
    target: String,
    result: Result<()>,
}

/// State machine for one in-flight put.
///
/// Owned by a single task; `run` consumes completions in arrival order. The
/// acknowledgment channel is taken exactly once, by whichever of the commit
/// tracker or the fallback exhaustion path fires first. The driver keeps
/// dispatching after acknowledgment so the operation still chases the full
/// replication factor.
struct PutDriver {
    key: String,
    event: Bytes,
    storage: Arc<dyn EventStore>,
    transport: Arc<dyn PeerTransport>,
    topology: PeerTopology,
    tracker: CommitTracker,
    replication_factor: usize,
    remaining_to_start: usize,
    tried: HashSet<String>,
    fallback: Option<VecDeque<Peer>>,
    outstanding: usize,
    completions: mpsc::UnboundedSender<Completion>,
    ack: Option<oneshot::Sender<Result<()>>>,
}

impl PutDriver {
    async fn run(mut self, mut completions: mpsc::UnboundedReceiver<Completion>) {
        while self.outstanding > 0 {
            let Some(done) = completions.recv().await else {
                break;
            };
            self.outstanding -= 1;
            match done.result {
                Ok(()) => {
                    tracing::debug!(
                        "replica write to {} succeeded for key {}",
                        done.target,
                        self.key
                    );
                    if self.tracker.on_success() {
                        tracing::info!("commit level reached for key {}, acknowledging", self.key);
                        if let Some(ack) = self.ack.take() {
                            let _ = ack.send(Ok(()));
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        "replica write to {} failed for key {}: {}",
                        done.target,
                        self.key,
                        e
                    );
                    // the failed write's slot needs to be started again
                    self.remaining_to_start += 1;
                    self.run_fallback();
                }
            }
        }
    }

    fn dispatch_local(&mut self) {
        self.remaining_to_start -= 1;
        self.outstanding += 1;
        tracing::debug!("dispatching local write for key {}", self.key);
        let storage = Arc::clone(&self.storage);
        let key = self.key.clone();
        let event = self.event.clone();
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let result = storage.write(&key, event).await;
            let _ = tx.send(Completion {
                target: "local".into(),
                result,
            });
        });
    }

    fn dispatch_peer(&mut self, peer: Peer) {
        // never dispatch to the same peer twice within one operation
        if !self.tried.insert(peer.id.clone()) {
            return;
        }
        self.remaining_to_start -= 1;
        self.outstanding += 1;
        tracing::debug!("dispatching replica write to {} for key {}", peer.id, self.key);
        let transport = Arc::clone(&self.transport);
        let key = self.key.clone();
        let event = self.event.clone();
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let result = transport.replicate(&peer, &key, event).await;
            let _ = tx.send(Completion {
                target: peer.id,
                result,
            });
        });
    }

    /// Dispatch replacement writes from the untried-peer queue until the
    /// replication factor's worth of writes has been started or the queue is
    /// exhausted. Exhaustion before acknowledgment is the operation's single
    /// terminal error.
    fn run_fallback(&mut self) {
        if self.fallback.is_none() {
            let queue = build_fallback_queue(&self.topology, &self.tried);
            tracing::debug!(
                "entering fallback dispatch for key {} ({} untried peers)",
                self.key,
                queue.len()
            );
            self.fallback = Some(queue);
        }

        while self.remaining_to_start > 0 {
            match self.fallback.as_mut().and_then(|queue| queue.pop_front()) {
                Some(peer) => self.dispatch_peer(peer),
                None => {
                    if !self.tracker.acknowledged() {
                        self.tracker.mark_acknowledged();
                        tracing::warn!(
                            "peers exhausted for key {}: {} of {} replicas not started",
                            self.key,
                            self.remaining_to_start,
                            self.replication_factor
                        );
                        if let Some(ack) = self.ack.take() {
                            let _ = ack.send(Err(crate::Error::ReplicationShortfall {
                                missing: self.remaining_to_start,
                                required: self.replication_factor,
                            }));
                        }
                    }
                    return;
                }
            }
        }
    }
}
