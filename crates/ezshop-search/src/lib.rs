// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval-side adapters for the EZShop assistant.
//!
//! [`HttpSearchClient`] talks to the embedding search service and
//! [`S3ObjectStore`] persists uploaded query images.

pub mod client;
pub mod object_store;

pub use client::{HttpSearchClient, normalize_item};
pub use object_store::S3ObjectStore;
