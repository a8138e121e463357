//! Local event storage abstraction
//!
//! The coordinator writes the local replica through the `EventStore` trait and
//! never sees the engine behind it. `MemoryStore` is the in-memory reference
//! backend used by tests and embedding hosts that bring no engine of their own.

use crate::common::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// Trait for local event storage backends
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn write(&self, key: &str, event: Bytes) -> Result<()>;
}

/// In-memory store (default)
pub struct MemoryStore {
    events: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.events.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn write(&self, key: &str, event: Bytes) -> Result<()> {
        self.events.lock().unwrap().insert(key.to_string(), event);
        Ok(())
    }
}
