// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the EZShop collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod cache;
pub mod generation;
pub mod history;
pub mod object_store;
pub mod search;
pub mod summary;

pub use adapter::PluginAdapter;
pub use cache::MemoryCache;
pub use generation::GenerationModel;
pub use history::HistoryStore;
pub use object_store::ObjectStore;
pub use search::SearchAdapter;
pub use summary::SummaryRepository;
