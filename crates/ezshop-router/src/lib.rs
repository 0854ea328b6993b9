// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent routing and retrieval for the EZShop assistant.
//!
//! This crate provides:
//! - [`Router`]: one schema-constrained generation call that decides whether a
//!   text turn needs a search, and which one
//! - [`RetrievalGateway`]: the search call with its single unfiltered fallback

pub mod decision;
pub mod prompt;
pub mod retrieval;
pub mod router;

pub use decision::{RouteTarget, RouterDecision};
pub use prompt::{NO_HISTORY, render_history};
pub use retrieval::RetrievalGateway;
pub use router::Router;
