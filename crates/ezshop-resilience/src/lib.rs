// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives shared by every external call.
//!
//! - [`RetryPolicy`]: bounded exponential backoff with a retryable-error predicate.
//! - [`RateLimiter`]: fixed-window limiter where excess callers queue.
//! - [`with_deadline`]: maps an elapsed timeout to [`EzshopError::Timeout`].
//!
//! [`EzshopError::Timeout`]: ezshop_core::EzshopError::Timeout

pub mod deadline;
pub mod rate_limit;
pub mod retry;

pub use deadline::with_deadline;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
