// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the EZShop conversational commerce assistant.
//!
//! This crate provides the error taxonomy, the domain types that cross crate
//! boundaries, and the adapter traits every external collaborator implements.

pub mod content_type;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::EzshopError;
pub use types::{AdapterType, HealthStatus};

pub use traits::history::HistoryPair;
pub use traits::{
    GenerationModel, HistoryStore, MemoryCache, ObjectStore, PluginAdapter, SearchAdapter,
    SummaryRepository,
};
