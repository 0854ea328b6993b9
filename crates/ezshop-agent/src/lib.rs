// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn orchestration for the EZShop assistant.
//!
//! The [`Orchestrator`] ties together history, personalization, routing,
//! retrieval and the [`Synthesizer`] for each incoming turn, and owns the
//! background writes that follow every reply.

pub mod orchestrator;
pub mod prompts;
pub mod shutdown;
pub mod stage;
pub mod synthesizer;

pub use orchestrator::{Orchestrator, TurnReply, TurnRequest, TurnSettings};
pub use shutdown::install_signal_handler;
pub use stage::{TurnFailure, TurnStage};
pub use synthesizer::Synthesizer;
