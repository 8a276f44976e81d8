//! Personal best score
//!
//! One scalar, persisted locally under `snake_best_score` as a plain integer
//! string. Read once at startup, written through on every new high. A store
//! that cannot be read or written never stops the game: the value simply
//! lives in memory for the rest of the session.

use crate::persistence::KeyValueStore;

/// Best score tracker with write-through persistence
pub struct BestScore {
    value: u64,
    store: Box<dyn KeyValueStore>,
    /// Set after the first failed write; later writes are skipped
    memory_only: bool,
}

impl BestScore {
    /// Storage key (shared with earlier clients)
    pub const STORAGE_KEY: &'static str = "snake_best_score";

    /// Load from `store`; absent or corrupt values read as zero
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let value = match store.get(Self::STORAGE_KEY) {
            Ok(Some(raw)) => parse_score(&raw).unwrap_or_else(|| {
                log::warn!("Ignoring corrupt best score {raw:?}");
                0
            }),
            Ok(None) => 0,
            Err(err) => {
                log::warn!("Could not read best score: {err}");
                0
            }
        };
        log::info!("Best score: {value}");
        Self {
            value,
            store,
            memory_only: false,
        }
    }

    pub fn get(&self) -> u64 {
        self.value
    }

    /// True once persistence has been given up on
    pub fn is_memory_only(&self) -> bool {
        self.memory_only
    }

    /// Record `score`; returns true (and persists) only when it beats the best
    pub fn record(&mut self, score: u64) -> bool {
        if score <= self.value {
            return false;
        }
        self.value = score;
        if !self.memory_only {
            if let Err(err) = self.store.set(Self::STORAGE_KEY, &score.to_string()) {
                log::warn!("Could not save best score ({err}); keeping it for this session only");
                self.memory_only = true;
            }
        }
        true
    }
}

impl std::fmt::Debug for BestScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestScore")
            .field("value", &self.value)
            .field("memory_only", &self.memory_only)
            .finish()
    }
}

/// Accepts "123", " 123 ", and the "123.0" older clients sometimes wrote
fn parse_score(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0).then_some(v as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, StorageError};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Memory store whose contents stay visible to the test
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.borrow_mut().set(key, value)
        }
    }

    #[test]
    fn test_missing_and_corrupt_read_as_zero() {
        assert_eq!(BestScore::load(Box::new(MemoryStore::new())).get(), 0);
        for junk in ["", "abc", "-5", "1e400", "12.5", "{\"score\":3}"] {
            let store = MemoryStore::new().with(BestScore::STORAGE_KEY, junk);
            assert_eq!(BestScore::load(Box::new(store)).get(), 0, "{junk:?}");
        }
    }

    #[test]
    fn test_loads_existing_value() {
        let store = MemoryStore::new().with(BestScore::STORAGE_KEY, "120");
        assert_eq!(BestScore::load(Box::new(store)).get(), 120);
        let store = MemoryStore::new().with(BestScore::STORAGE_KEY, "77.0");
        assert_eq!(BestScore::load(Box::new(store)).get(), 77);
    }

    #[test]
    fn test_record_writes_through_only_on_new_high() {
        let shared = SharedStore::default();
        let mut best = BestScore::load(Box::new(shared.clone()));

        assert!(best.record(10));
        assert!(!best.record(10));
        assert!(!best.record(3));
        assert!(best.record(25));
        assert_eq!(best.get(), 25);
        assert_eq!(
            shared.get(BestScore::STORAGE_KEY).unwrap().as_deref(),
            Some("25")
        );

        // A fresh load sees the persisted value
        assert_eq!(BestScore::load(Box::new(shared)).get(), 25);
    }

    #[test]
    fn test_write_failure_keeps_session_value() {
        let mut best = BestScore::load(Box::new(MemoryStore::read_only()));
        assert!(best.record(50));
        assert!(best.is_memory_only());
        assert_eq!(best.get(), 50);
        assert!(best.record(60));
        assert_eq!(best.get(), 60);
    }
}
