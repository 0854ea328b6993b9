// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process expiring cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use ezshop_core::{AdapterType, EzshopError, HealthStatus, MemoryCache, PluginAdapter};

/// Writes between full sweeps of expired entries.
const SWEEP_EVERY: u64 = 256;

/// [`MemoryCache`] over a concurrent map.
///
/// Expired entries are dropped when read, on every `keys_matching` scan, and
/// by a full sweep once every [`SWEEP_EVERY`] writes.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Entry>,
    writes: AtomicU64,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including ones that expired but were not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep(&self, now: Instant) {
        self.entries.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl PluginAdapter for InMemoryCache {
    fn name(&self) -> &str {
        "in-memory-cache"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EzshopError> {
        self.entries.clear();
        Ok(())
    }
}

#[async_trait]
impl MemoryCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, EzshopError> {
        let now = Instant::now();
        let hit = self.entries.get(key).map(|e| (e.expires_at > now, e.value.clone()));
        match hit {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                self.entries.remove_if(key, |_, e| e.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EzshopError> {
        let now = Instant::now();
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep(now);
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), EzshopError> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, EzshopError> {
        let now = Instant::now();
        self.sweep(now);
        Ok(self
            .entries
            .iter()
            .filter(|e| e.expires_at > now && glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect())
    }
}

/// Matches `text` against `pattern`, where `*` matches any run of characters
/// (including none) and every other character matches itself.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matching() {
        assert!(glob_match("summary:abc:*", "summary:abc:123"));
        assert!(glob_match("summary:abc:*", "summary:abc:"));
        assert!(!glob_match("summary:abc:*", "summary:abc"));
        assert!(!glob_match("summary:abc:*", "summary:abd:1"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a*c*e", "abcde"));
        assert!(!glob_match("a*c*e", "abcdf"));
        assert!(glob_match("exact", "exact"));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn keys_matching_skips_expired_entries() {
        let cache = InMemoryCache::new();
        cache.set("u:1", "a", Duration::from_secs(5)).await.unwrap();
        cache.set("u:2", "b", Duration::from_secs(60)).await.unwrap();
        cache.set("v:1", "c", Duration::from_secs(60)).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;

        let keys = cache.keys_matching("u:*").await.unwrap();
        assert_eq!(keys, vec!["u:2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_swept_without_being_read() {
        let cache = InMemoryCache::new();
        for i in 0..1_000 {
            cache
                .set(&format!("summary:{i}"), "v", Duration::from_secs(1))
                .await
                .unwrap();
        }
        tokio::time::advance(Duration::from_secs(3600)).await;

        cache.set("fresh", "v", Duration::from_secs(60)).await.unwrap();
        assert!(cache.keys_matching("summary:*").await.unwrap().is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_alone_eventually_sweep() {
        let cache = InMemoryCache::new();
        cache.set("stale", "v", Duration::from_secs(1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;

        for i in 0..SWEEP_EVERY {
            cache
                .set(&format!("k{i}"), "v", Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), SWEEP_EVERY as usize);
    }

    #[tokio::test]
    async fn delete_ignores_missing_keys() {
        let cache = InMemoryCache::new();
        cache.set("a", "1", Duration::from_secs(60)).await.unwrap();
        cache
            .delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_value_and_ttl() {
        let cache = InMemoryCache::new();
        cache.set("a", "1", Duration::from_secs(60)).await.unwrap();
        cache.set("a", "2", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(cache.len(), 1);
    }
}
