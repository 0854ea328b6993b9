// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the EZShop assistant.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all EZShop adapter traits and core operations.
#[derive(Debug, Error)]
pub enum EzshopError {
    /// Caller input failed validation. Never retried.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        /// Every missing or invalid field, in declaration order.
        fields: Vec<String>,
    },

    /// An argument is outside its accepted domain (e.g. a non-positive look-back).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Rate-limited or temporarily unavailable provider. Eligible for retry.
    #[error("transient provider error: {message}")]
    TransientProvider {
        message: String,
        source: Option<BoxError>,
    },

    /// Malformed output, bad credentials, rejected request. Fatal.
    #[error("provider error: {message}")]
    PermanentProvider {
        message: String,
        source: Option<BoxError>,
    },

    /// Cache or log backend is unreachable or failed a query.
    #[error("store unavailable: {source}")]
    StoreUnavailable { source: BoxError },

    /// The search service could not be reached or answered with an error.
    #[error("retrieval unavailable: {message}")]
    RetrievalUnavailable {
        message: String,
        source: Option<BoxError>,
    },

    /// An external call exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Configuration errors (invalid TOML, missing credentials, bad header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EzshopError {
    /// Shorthand for wrapping any backend error as [`EzshopError::StoreUnavailable`].
    pub fn store<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::StoreUnavailable { source: err.into() }
    }

    /// Returns true when a retry with backoff may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientProvider { .. } | Self::Timeout { .. })
    }

    /// Returns true when the caller sent bad input (maps to a 4xx response).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidArgument(_))
    }
}
