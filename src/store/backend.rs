//! Key-value backend contract and an in-process implementation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::{StoreError, StoreResult};

/// The primitive operations the persistence gateway needs.
///
/// Shaped after Redis: string keys, unordered sets, and append-only lists
/// read by inclusive index range (negative indices count from the end).
/// Each call is one atomic operation; there is no multi-key transaction.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> StoreResult<()>;
    /// Delete keys of any kind. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> StoreResult<()>;
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()>;
    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()>;
    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;
    /// Append to the tail of a list.
    async fn list_push(&self, key: &str, value: String) -> StoreResult<()>;
    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    strings: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
    lists: HashMap<String, Vec<String>>,
}

/// In-memory backend. Set members come back sorted.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> StoreResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::backend("memory backend lock poisoned"))?;
        Ok(f(&mut state))
    }
}

/// Resolve a Redis-style inclusive range against a list of `len` items.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_state(|s| s.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.with_state(|s| {
            s.strings.insert(key.to_string(), value);
        })
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        self.with_state(|s| {
            for key in keys {
                s.strings.remove(key);
                s.sets.remove(key);
                s.lists.remove(key);
            }
        })
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        self.with_state(|s| {
            s.sets
                .entry(key.to_string())
                .or_default()
                .insert(member.to_string());
        })
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        self.with_state(|s| {
            if let Some(set) = s.sets.get_mut(key) {
                set.remove(member);
                if set.is_empty() {
                    s.sets.remove(key);
                }
            }
        })
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.with_state(|s| {
            s.sets
                .get(key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    async fn list_push(&self, key: &str, value: String) -> StoreResult<()> {
        self.with_state(|s| {
            s.lists.entry(key.to_string()).or_default().push(value);
        })
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>> {
        self.with_state(|s| {
            let Some(list) = s.lists.get(key) else {
                return Vec::new();
            };
            match resolve_range(list.len(), start, stop) {
                Some((from, to)) => list[from..=to].to_vec(),
                None => Vec::new(),
            }
        })
    }
}
