// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The router's structured output and its validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ezshop_core::EzshopError;
use ezshop_core::types::{
    ResponseSchema, SearchCollection, SearchFilter, SearchQuery, strip_code_fence,
};

/// Where the answer to a text turn comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// Product catalogue search.
    Products,
    /// Store policies and FAQ search.
    Faq,
    /// Answerable from the conversation history or user summary alone.
    AlreadyKnown,
}

impl RouteTarget {
    /// The search collection for this target, `None` for [`RouteTarget::AlreadyKnown`].
    pub fn collection(self) -> Option<SearchCollection> {
        match self {
            Self::Products => Some(SearchCollection::Products),
            Self::Faq => Some(SearchCollection::Faq),
            Self::AlreadyKnown => None,
        }
    }
}

/// Routing decision for one text turn. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RouterDecision {
    /// Whether the reply needs context beyond history and summary.
    pub needs_context: bool,
    /// The user's intent in their own language, e.g. "Tìm kệ sách màu đen".
    #[serde(default)]
    pub intent: String,
    /// Search text; empty when the target is `already_known`.
    #[serde(default)]
    pub query: Option<String>,
    pub target: RouteTarget,
    /// Structured product filter. Ignored for FAQ searches.
    #[serde(default)]
    pub filter: Option<SearchFilter>,
}

impl RouterDecision {
    /// The search to run for this decision, if any.
    ///
    /// No search runs when context is not needed or the target is
    /// `already_known`. An empty query falls back to the intent. Empty
    /// filters are dropped, as are filters on FAQ searches.
    pub fn search_query(&self) -> Option<SearchQuery> {
        if !self.needs_context {
            return None;
        }
        let collection = self.target.collection()?;
        let text = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .or_else(|| Some(self.intent.trim()).filter(|i| !i.is_empty()))?;
        let filter = match collection {
            SearchCollection::Products => self.filter.clone().filter(|f| !f.is_empty()),
            SearchCollection::Faq => None,
        };
        Some(SearchQuery {
            query: text.to_string(),
            filter,
            collection,
        })
    }
}

/// The JSON schema the model's routing output must satisfy.
pub fn decision_schema() -> ResponseSchema {
    ResponseSchema {
        name: "router_decision".to_string(),
        schema: schemars::schema_for!(RouterDecision).to_value(),
    }
}

/// Compiles [`decision_schema`] for local validation.
pub fn decision_validator() -> Result<jsonschema::Validator, EzshopError> {
    jsonschema::validator_for(&decision_schema().schema)
        .map_err(|e| EzshopError::Internal(format!("router decision schema does not compile: {e}")))
}

/// Parses and validates raw model output.
///
/// Output that is not JSON, violates the schema, or does not deserialize is a
/// permanent failure for the turn.
pub fn parse_decision(
    raw: &str,
    validator: &jsonschema::Validator,
) -> Result<RouterDecision, EzshopError> {
    let value: Value =
        serde_json::from_str(strip_code_fence(raw)).map_err(|e| EzshopError::PermanentProvider {
            message: format!("router output is not JSON: {e}"),
            source: Some(Box::new(e)),
        })?;

    let violations: Vec<String> = validator
        .iter_errors(&value)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{path}: {e}")
            }
        })
        .collect();
    if !violations.is_empty() {
        return Err(EzshopError::PermanentProvider {
            message: format!(
                "router output failed schema validation: {}",
                violations.join("; ")
            ),
            source: None,
        });
    }

    serde_json::from_value(value).map_err(|e| EzshopError::PermanentProvider {
        message: format!("router output did not match decision: {e}"),
        source: Some(Box::new(e)),
    })
}
