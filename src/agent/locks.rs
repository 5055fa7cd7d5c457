//! Per-chat turn locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Registry handing out one async mutex per chat id.
///
/// Every session of the same chat, however it was obtained, serializes its
/// turns on the same lock. Entries are dropped once no session holds them.
#[derive(Debug, Default, Clone)]
pub struct ChatLocks {
    inner: Arc<Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>>,
}

impl ChatLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, chat_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(existing) = locks.get(chat_id).and_then(Weak::upgrade) {
            return existing;
        }
        locks.retain(|_, weak| weak.strong_count() > 0);
        let lock = Arc::new(tokio::sync::Mutex::new(()));
        locks.insert(chat_id.to_string(), Arc::downgrade(&lock));
        lock
    }

    /// Number of chats with a live lock.
    pub fn active(&self) -> usize {
        let locks = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_chat_shares_a_lock() {
        let locks = ChatLocks::new();
        let a = locks.lock_for("c1");
        let b = locks.lock_for("c1");
        let other = locks.lock_for("c2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(locks.active(), 2);
    }

    #[test]
    fn released_locks_are_pruned() {
        let locks = ChatLocks::new();
        drop(locks.lock_for("c1"));
        let _c2 = locks.lock_for("c2");
        assert_eq!(locks.active(), 1);
        assert_eq!(locks.inner.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_turn_waits_for_the_first() {
        let locks = ChatLocks::new();
        let lock = locks.lock_for("c1");
        let held = lock.clone().lock_owned().await;
        assert!(locks.lock_for("c1").try_lock().is_err());
        drop(held);
        assert!(locks.lock_for("c1").try_lock().is_ok());
    }
}
