//! Commit-level acknowledgment state machine
//!
//! One tracker per put operation. Every successful replica write feeds
//! `on_success`; the tracker decides the single instant at which the caller
//! is acknowledged for the configured commit level. Failures never reach the
//! tracker, they engage fallback dispatch instead.

use crate::CommitLevel;

/// Strict majority of the replication factor.
///
/// A bare half is not a majority: rf=1 → 1, rf=2 → 2, rf=3 → 2, rf=4 → 3,
/// rf=5 → 3.
pub fn majority(replication_factor: usize) -> usize {
    let mut majority = replication_factor.div_ceil(2);
    if replication_factor % 2 == 0 {
        majority += 1;
    }
    majority
}

/// Per-operation acknowledgment state.
#[derive(Debug)]
pub struct CommitTracker {
    level: CommitLevel,
    replication_factor: usize,
    remaining_to_commit: usize,
    acknowledged: bool,
}

impl CommitTracker {
    pub fn new(level: CommitLevel, replication_factor: usize) -> Self {
        Self {
            level,
            replication_factor,
            remaining_to_commit: replication_factor,
            acknowledged: false,
        }
    }

    /// Record one successful replica write.
    ///
    /// Returns true exactly once, at the moment the commit level is reached.
    /// Successes arriving after acknowledgment still count down but have no
    /// observable effect on the caller.
    pub fn on_success(&mut self) -> bool {
        self.remaining_to_commit = self.remaining_to_commit.saturating_sub(1);
        if self.acknowledged {
            return false;
        }
        let reached = match self.level {
            CommitLevel::One => true,
            CommitLevel::All => self.remaining_to_commit == 0,
            CommitLevel::Quorum => {
                self.remaining_to_commit <= self.replication_factor - majority(self.replication_factor)
            }
        };
        if reached {
            self.acknowledged = true;
        }
        reached
    }

    /// Claim the once-only acknowledgment for a terminal failure report.
    pub fn mark_acknowledged(&mut self) {
        self.acknowledged = true;
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }
}
