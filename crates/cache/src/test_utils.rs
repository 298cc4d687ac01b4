//! Test utilities for the cache layer.
//!
//! Provides [`MemoryBackend`], an in-process [`CacheBackend`] with fault
//! injection, so cache semantics can be exercised without a Redis server.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{CacheBackend, CacheError, CacheResult};

#[derive(Debug, Clone)]
enum Entry {
    Value(String),
    Set(BTreeSet<String>),
}

/// In-memory cache backend.
///
/// TTLs are accepted and ignored; expiry behaviour is not under test here.
/// `fail_keys_containing` makes every operation touching a matching key
/// fail with a backend error, for exercising failure paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
    fail_substring: Mutex<Option<String>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on keys containing `substring` fail.
    pub fn fail_keys_containing(&self, substring: &str) {
        *self
            .fail_substring
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(substring.to_string());
    }

    /// Clear any injected failure.
    pub fn heal(&self) {
        *self
            .fail_substring
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    fn check(&self, key: &str) -> CacheResult<()> {
        let guard = self
            .fail_substring
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(substring) = guard.as_deref() {
            if key.contains(substring) {
                return Err(CacheError::Redis(format!("injected failure for {key}")));
            }
        }
        Ok(())
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check(key)?;
        match self.entries().get(key) {
            Some(Entry::Value(v)) => Ok(Some(v.clone())),
            Some(Entry::Set(_)) => Err(CacheError::Redis(format!("WRONGTYPE for key {key}"))),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, _ttl_secs: Option<i64>) -> CacheResult<()> {
        self.check(key)?;
        self.entries()
            .insert(key.to_string(), Entry::Value(value.to_string()));
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.check(key)?;
        self.entries().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.check(key)?;
        Ok(self.entries().contains_key(key))
    }

    async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        self.check(key)?;
        let mut entries = self.entries();
        let current = match entries.get(key) {
            Some(Entry::Value(v)) => v
                .parse::<i64>()
                .map_err(|_| CacheError::Redis(format!("not an integer: {v}")))?,
            Some(Entry::Set(_)) => {
                return Err(CacheError::Redis(format!("WRONGTYPE for key {key}")));
            }
            None => 0,
        };
        let next = current + delta;
        entries.insert(key.to_string(), Entry::Value(next.to_string()));
        Ok(next)
    }

    async fn smembers(&self, key: &str) -> CacheResult<Vec<String>> {
        self.check(key)?;
        match self.entries().get(key) {
            Some(Entry::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(Entry::Value(_)) => Err(CacheError::Redis(format!("WRONGTYPE for key {key}"))),
            None => Ok(Vec::new()),
        }
    }

    async fn sadd(&self, key: &str, members: Vec<String>) -> CacheResult<()> {
        self.check(key)?;
        let mut entries = self.entries();
        match entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()))
        {
            Entry::Set(set) => {
                set.extend(members);
                Ok(())
            }
            Entry::Value(_) => Err(CacheError::Redis(format!("WRONGTYPE for key {key}"))),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> CacheResult<()> {
        self.check(key)?;
        let mut entries = self.entries();
        let mut now_empty = false;
        if let Some(Entry::Set(set)) = entries.get_mut(key) {
            set.remove(member);
            now_empty = set.is_empty();
        }
        // Redis removes a set key once its last member is gone.
        if now_empty {
            entries.remove(key);
        }
        Ok(())
    }
}
