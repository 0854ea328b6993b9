// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only conversation log adapter trait.

use async_trait::async_trait;

use crate::error::EzshopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Exchange;

/// A `(user_query, response)` pair returned by [`HistoryStore::recent`].
pub type HistoryPair = (String, String);

/// Validated, append-only log of exchanges per user.
#[async_trait]
pub trait HistoryStore: PluginAdapter {
    /// Appends one exchange.
    ///
    /// Fails with [`EzshopError::Validation`] naming every missing or invalid
    /// field; nothing is written in that case.
    async fn append(&self, exchange: &Exchange) -> Result<(), EzshopError>;

    /// Returns at most `look_back` pairs, newest first.
    ///
    /// `look_back <= 0` fails with [`EzshopError::InvalidArgument`] before any
    /// storage access. Records missing a query or response are skipped.
    async fn recent(&self, user_id: &str, look_back: i64) -> Result<Vec<HistoryPair>, EzshopError>;
}
