// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted search service and object store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ezshop_core::content_type;
use ezshop_core::types::{SearchItem, SearchQuery};
use ezshop_core::{
    AdapterType, EzshopError, HealthStatus, ObjectStore, PluginAdapter, SearchAdapter,
};

/// One scripted outcome for a search call.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Items(Vec<SearchItem>),
    Unavailable,
}

/// Search service mock. Unscripted calls return no items.
#[derive(Default)]
pub struct MockSearch {
    text: Mutex<VecDeque<SearchOutcome>>,
    image: Mutex<VecDeque<SearchOutcome>>,
    queries: Mutex<Vec<SearchQuery>>,
    image_calls: AtomicUsize,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_text(&self, outcome: SearchOutcome) {
        self.text.lock().await.push_back(outcome);
    }

    pub async fn push_image(&self, outcome: SearchOutcome) {
        self.image.lock().await.push_back(outcome);
    }

    /// Every text query received, in order.
    pub async fn text_queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().await.clone()
    }

    pub async fn text_calls(&self) -> usize {
        self.queries.lock().await.len()
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    fn resolve(outcome: Option<SearchOutcome>) -> Result<Vec<SearchItem>, EzshopError> {
        match outcome {
            None => Ok(vec![]),
            Some(SearchOutcome::Items(items)) => Ok(items),
            Some(SearchOutcome::Unavailable) => Err(EzshopError::RetrievalUnavailable {
                message: "mock search down".into(),
                source: None,
            }),
        }
    }
}

#[async_trait]
impl PluginAdapter for MockSearch {
    fn name(&self) -> &str {
        "mock-search"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SearchAdapter for MockSearch {
    async fn search_text(&self, query: &SearchQuery) -> Result<Vec<SearchItem>, EzshopError> {
        self.queries.lock().await.push(query.clone());
        Self::resolve(self.text.lock().await.pop_front())
    }

    async fn search_image(&self, _image: &[u8]) -> Result<Vec<SearchItem>, EzshopError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        Self::resolve(self.image.lock().await.pop_front())
    }
}

/// Object store mock returning `https://mock-store.local/<n>.<ext>`.
#[derive(Default)]
pub struct MockObjectStore {
    uploads: Mutex<Vec<(usize, String)>>,
    fail: AtomicBool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    /// `(byte length, content type)` of every successful upload.
    pub async fn uploads(&self) -> Vec<(usize, String)> {
        self.uploads.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockObjectStore {
    fn name(&self) -> &str {
        "mock-object-store"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, EzshopError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, EzshopError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EzshopError::store("mock object store down"));
        }
        let mut uploads = self.uploads.lock().await;
        uploads.push((bytes.len(), content_type.to_string()));
        let ext = content_type::from_mime(content_type).extension;
        Ok(format!("https://mock-store.local/{}.{ext}", uploads.len()))
    }
}
