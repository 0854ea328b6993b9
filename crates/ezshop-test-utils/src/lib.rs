// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for EZShop tests.
//!
//! Every mock records its calls so tests can assert on call counts and
//! arguments, and each one can be told to fail.

pub mod mock_generation;
pub mod mock_search;
pub mod mock_stores;

pub use mock_generation::{MockGeneration, MockReply};
pub use mock_search::{MockObjectStore, MockSearch, SearchOutcome};
pub use mock_stores::{FailingCache, MockHistory, MockSummaryRepository};

/// A search item with a `name` attribute, for assertions on retrieval output.
pub fn item(id: &str, name: &str) -> ezshop_core::types::SearchItem {
    let mut attributes = serde_json::Map::new();
    attributes.insert("name".into(), serde_json::Value::String(name.into()));
    ezshop_core::types::SearchItem {
        id: id.into(),
        score: 0.9,
        attributes,
    }
}
