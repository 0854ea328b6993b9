// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personalization store: cached rolling summaries with content-hash dedup.
//!
//! Key layout, with `U` the hex SHA-256 prefix of the user id:
//!
//! - `summary:U` holds the canonical summary.
//! - `summary:U:C` marks that the exchange with content hash `C` was already
//!   merged, and holds the summary it produced.
//!
//! After every committed update all `summary:U:*` keys except the one just
//! written are deleted. Concurrent updates for one user are not serialized;
//! the last write to complete wins.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use ezshop_core::types::{Exchange, UserSummary, now_timestamp};
use ezshop_core::{EzshopError, MemoryCache, SummaryRepository};

use crate::summarizer::{Summarizer, SummaryResult};

const KEY_PREFIX: &str = "summary";

/// Result of [`PersonalizationStore::retrieve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieved {
    Found(UserSummary),
    NotFound,
}

impl Retrieved {
    /// The summary, or an empty one for `user_id`.
    pub fn or_empty(self, user_id: &str) -> UserSummary {
        match self {
            Self::Found(summary) => summary,
            Self::NotFound => UserSummary::empty(user_id),
        }
    }
}

/// Composes the cache, an optional durable repository, and the summarizer.
pub struct PersonalizationStore {
    cache: Arc<dyn MemoryCache>,
    repository: Option<Arc<dyn SummaryRepository>>,
    summarizer: Arc<Summarizer>,
    ttl: Duration,
}

impl PersonalizationStore {
    pub fn new(cache: Arc<dyn MemoryCache>, summarizer: Arc<Summarizer>, ttl: Duration) -> Self {
        Self {
            cache,
            repository: None,
            summarizer,
            ttl,
        }
    }

    /// Adds a durable repository consulted on cache misses and written on every update.
    pub fn with_repository(mut self, repository: Arc<dyn SummaryRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Looks up the user's current summary.
    ///
    /// Cache first, then the repository (re-warming the cache on a hit). Backend
    /// failures are logged and read as a miss; the summarizer is never called.
    pub async fn retrieve(&self, user_id: &str) -> Result<Retrieved, EzshopError> {
        require_user_id(user_id)?;
        let key = canonical_key(user_id);

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<UserSummary>(&raw) {
                Ok(summary) => {
                    ezshop_prometheus::record_summary_cache("hit");
                    return Ok(Retrieved::Found(summary));
                }
                Err(e) => warn!(user_id, error = %e, "discarding undecodable cached summary"),
            },
            Ok(None) => ezshop_prometheus::record_summary_cache("miss"),
            Err(e) => {
                ezshop_prometheus::record_summary_cache("error");
                warn!(user_id, error = %e, "summary cache read failed, treating as miss");
            }
        }

        let Some(repository) = &self.repository else {
            return Ok(Retrieved::NotFound);
        };
        match repository.load(user_id).await {
            Ok(Some(summary)) => {
                if let Ok(raw) = serde_json::to_string(&summary)
                    && let Err(e) = self.cache.set(&key, &raw, self.ttl).await
                {
                    debug!(user_id, error = %e, "could not re-warm summary cache");
                }
                Ok(Retrieved::Found(summary))
            }
            Ok(None) => Ok(Retrieved::NotFound),
            Err(e) => {
                warn!(user_id, error = %e, "summary repository read failed, treating as miss");
                Ok(Retrieved::NotFound)
            }
        }
    }

    /// Merges `exchange` into the user's summary and commits the result.
    ///
    /// A byte-identical exchange already merged returns the cached summary
    /// without calling the summarizer. When the summarizer is unavailable the
    /// current summary is returned and nothing is written.
    pub async fn create_or_update(
        &self,
        user_id: &str,
        exchange: &Exchange,
    ) -> Result<UserSummary, EzshopError> {
        require_user_id(user_id)?;
        let raw_text = exchange.raw_text();
        let canonical = canonical_key(user_id);
        let marker = dedup_key(user_id, &raw_text);

        match self.cache.get(&marker).await {
            Ok(Some(raw)) => {
                if let Ok(summary) = serde_json::from_str::<UserSummary>(&raw) {
                    ezshop_prometheus::record_summary_cache("dedup_hit");
                    debug!(user_id, "identical exchange already merged");
                    return Ok(summary);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(user_id, error = %e, "dedup lookup failed, summarizing anyway"),
        }

        let current = self.retrieve(user_id).await?.or_empty(user_id);
        let mut summary = match self.summarizer.summarize(&raw_text, &current).await {
            SummaryResult::Updated(summary) => summary,
            SummaryResult::Unavailable => return Ok(current),
        };
        summary.user_id = user_id.to_string();
        summary.updated_at = now_timestamp();
        summary.cap_preferences(self.summarizer.max_preferences());

        let encoded = serde_json::to_string(&summary)
            .map_err(|e| EzshopError::Internal(format!("encoding summary: {e}")))?;
        let cached = match self.cache.set(&canonical, &encoded, self.ttl).await {
            Ok(()) => {
                if let Err(e) = self.cache.set(&marker, &encoded, self.ttl).await {
                    warn!(user_id, error = %e, "could not write dedup marker");
                }
                true
            }
            Err(e) => {
                warn!(user_id, error = %e, "summary cache write failed");
                false
            }
        };
        let mut committed = cached;

        if let Some(repository) = &self.repository {
            match repository.save(&summary).await {
                Ok(()) => committed = true,
                Err(e) => warn!(user_id, error = %e, "summary repository write failed"),
            }
        }

        if !committed {
            return Err(EzshopError::store("summary was not persisted to any backend"));
        }
        if !cached {
            // A stale canonical entry would shadow the repository on the next read.
            if let Err(e) = self.cache.delete(std::slice::from_ref(&canonical)).await {
                warn!(user_id, error = %e, "could not drop stale canonical summary");
            }
        }
        self.invalidate_others(user_id, &canonical, &marker).await;
        info!(
            user_id,
            preferences = summary.preferences.len(),
            "user summary updated"
        );
        Ok(summary)
    }

    async fn invalidate_others(&self, user_id: &str, canonical: &str, keep: &str) {
        let stale = match self.cache.keys_matching(&format!("{canonical}:*")).await {
            Ok(keys) => keys.into_iter().filter(|k| k != keep).collect::<Vec<_>>(),
            Err(e) => {
                warn!(user_id, error = %e, "could not list stale summary keys");
                return;
            }
        };
        if stale.is_empty() {
            return;
        }
        if let Err(e) = self.cache.delete(&stale).await {
            warn!(user_id, error = %e, "could not invalidate stale summary keys");
        } else {
            debug!(user_id, removed = stale.len(), "invalidated stale summary keys");
        }
    }
}

fn require_user_id(user_id: &str) -> Result<(), EzshopError> {
    if user_id.trim().is_empty() {
        return Err(EzshopError::Validation {
            message: "user_id cannot be empty".into(),
            fields: vec!["user_id".into()],
        });
    }
    Ok(())
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..16])
}

/// Cache key of the user's canonical summary.
pub fn canonical_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}:{}", short_hash(user_id))
}

/// Cache key marking that `raw_text` was already merged for the user.
pub fn dedup_key(user_id: &str, raw_text: &str) -> String {
    format!("{}:{}", canonical_key(user_id), short_hash(raw_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use ezshop_config::model::MemoryConfig;
    use ezshop_core::{AdapterType, HealthStatus, PluginAdapter};

    use crate::cache::InMemoryCache;
    use ezshop_resilience::RetryPolicy;
    use ezshop_test_utils::{FailingCache, MockGeneration, MockReply, MockSummaryRepository};
    use proptest::prelude::*;

    const TTL: Duration = Duration::from_secs(86_400);

    fn summarizer(model: Arc<MockGeneration>) -> Arc<Summarizer> {
        Arc::new(Summarizer::new(
            model,
            "gpt-4o-mini",
            &MemoryConfig::default(),
            RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(40), 2.0),
            Duration::from_secs(5),
        ))
    }

    fn fresh_store(summarizer: Arc<Summarizer>) -> PersonalizationStore {
        PersonalizationStore::new(Arc::new(InMemoryCache::new()), summarizer, TTL)
    }

    fn exchange(query: &str) -> Exchange {
        Exchange {
            user_id: "u1".into(),
            conversation_id: None,
            user_query: query.into(),
            image_ref: None,
            response: "Dạ, sản phẩm có giá 500.000đ".into(),
            context_snapshot: "ctx".into(),
            retrieved_items: vec![],
            timestamp: now_timestamp(),
        }
    }

    fn reply(prefs: &[&str]) -> MockReply {
        MockReply::Text(
            serde_json::json!({"personal_info": ["Tên: Lan"], "preferences": prefs}).to_string(),
        )
    }

    #[tokio::test]
    async fn retrieve_on_empty_cache_is_not_found_without_summarizing() {
        let model = Arc::new(MockGeneration::new());
        let store = fresh_store(summarizer(model.clone()));
        assert_eq!(store.retrieve("u1").await.unwrap(), Retrieved::NotFound);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn update_then_retrieve() {
        let model = MockGeneration::with_replies(vec![reply(&["giày chạy bộ"])]);
        let store = fresh_store(summarizer(model));
        let updated = store.create_or_update("u1", &exchange("giày nike")).await.unwrap();
        assert_eq!(updated.preferences, vec!["giày chạy bộ"]);
        assert!(!updated.updated_at.is_empty());

        let Retrieved::Found(found) = store.retrieve("u1").await.unwrap() else {
            panic!("summary should be cached");
        };
        assert_eq!(found, updated);
    }

    #[tokio::test]
    async fn identical_exchange_short_circuits_the_summarizer() {
        let model = MockGeneration::with_replies(vec![reply(&["a"]), reply(&["b"])]);
        let store = fresh_store(summarizer(model.clone()));
        let ex = exchange("same question");

        let first = store.create_or_update("u1", &ex).await.unwrap();
        let second = store.create_or_update("u1", &ex).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn new_exchange_invalidates_previous_dedup_marker() {
        let model = MockGeneration::with_replies(vec![reply(&["a"]), reply(&["b"]), reply(&["c"])]);
        let cache = Arc::new(InMemoryCache::new());
        let store = PersonalizationStore::new(cache.clone(), summarizer(model.clone()), TTL);

        let first = exchange("one");
        store.create_or_update("u1", &first).await.unwrap();
        store.create_or_update("u1", &exchange("two")).await.unwrap();

        let keys = cache.keys_matching(&format!("{}:*", canonical_key("u1"))).await.unwrap();
        assert_eq!(keys.len(), 1, "only the latest marker survives: {keys:?}");
        assert!(!keys.contains(&dedup_key("u1", &first.raw_text())));

        // Replaying the first exchange now goes back to the summarizer.
        let replayed = store.create_or_update("u1", &first).await.unwrap();
        assert_eq!(replayed.preferences, vec!["c"]);
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn other_users_keys_are_untouched() {
        let model = MockGeneration::with_replies(vec![reply(&["a"]), reply(&["b"])]);
        let cache = Arc::new(InMemoryCache::new());
        let store = PersonalizationStore::new(cache.clone(), summarizer(model), TTL);
        store.create_or_update("u1", &exchange("q")).await.unwrap();
        store.create_or_update("u2", &exchange("q")).await.unwrap();
        assert!(matches!(store.retrieve("u1").await.unwrap(), Retrieved::Found(_)));
        assert!(matches!(store.retrieve("u2").await.unwrap(), Retrieved::Found(_)));
    }

    #[tokio::test]
    async fn unavailable_summarizer_keeps_current_summary_and_writes_nothing() {
        let model = MockGeneration::with_replies(vec![reply(&["a"]), MockReply::Permanent]);
        let cache = Arc::new(InMemoryCache::new());
        let store = PersonalizationStore::new(cache.clone(), summarizer(model), TTL);
        let before = store.create_or_update("u1", &exchange("one")).await.unwrap();
        let entries = cache.len();

        let after = store.create_or_update("u1", &exchange("two")).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(cache.len(), entries);
    }

    #[tokio::test]
    async fn cache_outage_degrades_to_not_found() {
        let model = Arc::new(MockGeneration::new());
        let store = PersonalizationStore::new(Arc::new(FailingCache), summarizer(model), TTL);
        assert_eq!(store.retrieve("u1").await.unwrap(), Retrieved::NotFound);
    }

    #[tokio::test]
    async fn cache_outage_without_repository_reports_unpersisted_update() {
        let model = MockGeneration::with_replies(vec![reply(&["a"])]);
        let store = PersonalizationStore::new(Arc::new(FailingCache), summarizer(model), TTL);
        let err = store.create_or_update("u1", &exchange("q")).await.unwrap_err();
        assert!(matches!(err, EzshopError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn repository_backs_cache_misses_and_rewarms() {
        let model = MockGeneration::with_replies(vec![reply(&["durable"])]);
        let repo = Arc::new(MockSummaryRepository::new());
        let writer = fresh_store(summarizer(model.clone())).with_repository(repo.clone());
        writer.create_or_update("u1", &exchange("q")).await.unwrap();
        let loads_after_write = repo.load_calls();

        // A fresh cache, as after a restart.
        let cache = Arc::new(InMemoryCache::new());
        let reader = PersonalizationStore::new(cache.clone(), summarizer(model), TTL)
            .with_repository(repo.clone());
        let Retrieved::Found(found) = reader.retrieve("u1").await.unwrap() else {
            panic!("repository should supply the summary");
        };
        assert_eq!(found.preferences, vec!["durable"]);
        let loads = repo.load_calls();
        assert_eq!(loads, loads_after_write + 1);

        reader.retrieve("u1").await.unwrap();
        assert_eq!(repo.load_calls(), loads, "second read is served from the re-warmed cache");
        assert!(cache.get(&canonical_key("u1")).await.unwrap().is_some());
    }

    /// Cache whose writes to the canonical key fail while `fail_canonical` is set.
    struct FlakyCanonical {
        inner: InMemoryCache,
        fail_canonical: AtomicBool,
    }

    #[async_trait]
    impl PluginAdapter for FlakyCanonical {
        fn name(&self) -> &str {
            "flaky-canonical-cache"
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Cache
        }

        async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl MemoryCache for FlakyCanonical {
        async fn get(&self, key: &str) -> Result<Option<String>, EzshopError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EzshopError> {
            if self.fail_canonical.load(Ordering::SeqCst) && key == canonical_key("u1") {
                return Err(EzshopError::store("canonical write rejected"));
            }
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, keys: &[String]) -> Result<(), EzshopError> {
            self.inner.delete(keys).await
        }

        async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, EzshopError> {
            self.inner.keys_matching(pattern).await
        }
    }

    #[tokio::test]
    async fn repository_only_commit_still_invalidates_stale_keys() {
        let model = MockGeneration::with_replies(vec![reply(&["a"]), reply(&["b"]), reply(&["c"])]);
        let cache = Arc::new(FlakyCanonical {
            inner: InMemoryCache::new(),
            fail_canonical: AtomicBool::new(false),
        });
        let repo = Arc::new(MockSummaryRepository::new());
        let store = PersonalizationStore::new(cache.clone(), summarizer(model.clone()), TTL)
            .with_repository(repo);

        let first = exchange("one");
        store.create_or_update("u1", &first).await.unwrap();

        cache.fail_canonical.store(true, Ordering::SeqCst);
        let second = store.create_or_update("u1", &exchange("two")).await.unwrap();
        assert_eq!(second.preferences, vec!["b"]);

        let markers = cache
            .keys_matching(&format!("{}:*", canonical_key("u1")))
            .await
            .unwrap();
        assert!(markers.is_empty(), "stale markers survived: {markers:?}");
        let Retrieved::Found(current) = store.retrieve("u1").await.unwrap() else {
            panic!("repository should hold the committed summary");
        };
        assert_eq!(current.preferences, vec!["b"]);

        cache.fail_canonical.store(false, Ordering::SeqCst);
        let replayed = store.create_or_update("u1", &first).await.unwrap();
        assert_eq!(replayed.preferences, vec!["c"]);
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn empty_user_id_is_rejected() {
        let model = Arc::new(MockGeneration::new());
        let store = fresh_store(summarizer(model));
        assert!(store.retrieve("").await.unwrap_err().is_client_error());
        assert!(store.create_or_update(" ", &exchange("q")).await.unwrap_err().is_client_error());
    }

    #[test]
    fn keys_are_scoped_per_user_and_content() {
        assert_ne!(canonical_key("u1"), canonical_key("u2"));
        assert!(dedup_key("u1", "x").starts_with(&format!("{}:", canonical_key("u1"))));
        assert_ne!(dedup_key("u1", "x"), dedup_key("u1", "y"));
        assert_eq!(dedup_key("u1", "x"), dedup_key("u1", "x"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn preferences_never_exceed_cap(
            batches in proptest::collection::vec(
                proptest::collection::vec("[a-z]{1,8}", 0..25),
                1..5,
            )
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async {
                let replies = batches
                    .iter()
                    .map(|prefs| MockReply::Text(
                        serde_json::json!({"personal_info": [], "preferences": prefs}).to_string(),
                    ))
                    .collect();
                let model = MockGeneration::with_replies(replies);
                let store = fresh_store(summarizer(model));
                for (i, _) in batches.iter().enumerate() {
                    let summary = store
                        .create_or_update("u1", &exchange(&format!("q{i}")))
                        .await
                        .unwrap();
                    prop_assert!(summary.preferences.len() <= 10);
                }
                Ok(())
            })?;
        }
    }
}
