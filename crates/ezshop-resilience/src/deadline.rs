// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deadlines for external calls.

use std::future::Future;
use std::time::Duration;

use ezshop_core::EzshopError;

/// Awaits `fut` for at most `duration`.
///
/// An elapsed deadline becomes [`EzshopError::Timeout`]; the inner future is dropped.
pub async fn with_deadline<T, F>(duration: Duration, fut: F) -> Result<T, EzshopError>
where
    F: Future<Output = Result<T, EzshopError>>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| EzshopError::Timeout { duration })?
}
