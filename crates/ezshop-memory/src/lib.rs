// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term user memory for the EZShop assistant.
//!
//! A per-user rolling summary (personal info and up to ten preferences) is
//! merged by the generation model after each turn, kept in an expiring cache,
//! and optionally mirrored to a durable [`SummaryRepository`](ezshop_core::SummaryRepository).

pub mod cache;
pub mod store;
pub mod summarizer;

pub use cache::InMemoryCache;
pub use store::{PersonalizationStore, Retrieved};
pub use summarizer::{Summarizer, SummaryResult};
