//! Configuration for the coordinator

use crate::common::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consistency threshold controlling when a `put` caller is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommitLevel {
    /// Acknowledge on the first successful replica write.
    One,
    /// Acknowledge once a strict majority of the replication factor succeeded.
    #[default]
    Quorum,
    /// Acknowledge only once every replica write succeeded.
    All,
}

impl fmt::Display for CommitLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitLevel::One => write!(f, "ONE"),
            CommitLevel::Quorum => write!(f, "QUORUM"),
            CommitLevel::All => write!(f, "ALL"),
        }
    }
}

/// How replicas beyond the local write are spread across localities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicationStrategy {
    /// Replicas to place explicitly in other zones within the local region.
    #[serde(default)]
    pub other_zone_replicas: usize,

    /// Replicas to place explicitly in other regions.
    #[serde(default)]
    pub other_region_replicas: usize,
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Commit level (ONE / QUORUM / ALL)
    #[serde(default)]
    pub commit_level: CommitLevel,

    /// Total number of replicas (including the local write) per put
    #[serde(default = "default_replication_factor")]
    pub replication_factor: usize,

    /// Locality spread for replicas beyond the local write
    #[serde(default)]
    pub replication_strategy: ReplicationStrategy,
}

fn default_replication_factor() -> usize {
    1
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            commit_level: CommitLevel::default(),
            replication_factor: default_replication_factor(),
            replication_strategy: ReplicationStrategy::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.replication_factor == 0 {
            return Err(crate::Error::InvalidConfig(
                "replication_factor must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
