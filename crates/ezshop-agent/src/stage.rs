// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn stages, recorded in logs and on failures.
//!
//! A turn moves Start -> ContextGathering -> Routing (text only) ->
//! Retrieval (optional) -> Synthesis -> Persisting -> Done.

use std::fmt;

use ezshop_core::EzshopError;

/// Where a turn is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Start,
    /// History and summary reads, run concurrently.
    ContextGathering,
    /// Text turns only.
    Routing,
    Retrieval,
    Synthesis,
    /// Write-behind of history and summary.
    Persisting,
    Done,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnStage::Start => write!(f, "start"),
            TurnStage::ContextGathering => write!(f, "context_gathering"),
            TurnStage::Routing => write!(f, "routing"),
            TurnStage::Retrieval => write!(f, "retrieval"),
            TurnStage::Synthesis => write!(f, "synthesis"),
            TurnStage::Persisting => write!(f, "persisting"),
            TurnStage::Done => write!(f, "done"),
        }
    }
}

/// A turn that stopped before producing a reply.
#[derive(Debug, thiserror::Error)]
#[error("turn failed during {stage}: {source}")]
pub struct TurnFailure {
    pub stage: TurnStage,
    #[source]
    pub source: EzshopError,
}

impl TurnFailure {
    pub fn new(stage: TurnStage, source: EzshopError) -> Self {
        Self { stage, source }
    }

    pub fn into_error(self) -> EzshopError {
        self.source
    }
}
