// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across EZShop adapter traits.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Timestamp layout used for every persisted record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Returns the current UTC time in [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Generation,
    Search,
    ObjectStore,
    Cache,
    History,
    SummaryStore,
    Observability,
}

// --- Conversation log ---

/// One ranked candidate returned by the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    /// Opaque identifier assigned by the search service.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub score: f64,
    /// Arbitrary product or FAQ attributes (name, price, url, ...).
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// A single user query + assistant reply, as persisted to the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub user_query: String,
    /// Public URL of the uploaded image, for image turns.
    #[serde(default)]
    pub image_ref: Option<String>,
    pub response: String,
    /// The context block that was handed to the synthesizer.
    #[serde(default)]
    pub context_snapshot: String,
    #[serde(default)]
    pub retrieved_items: Vec<SearchItem>,
    /// Creation time in [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
}

impl Exchange {
    /// Text fed to the summarizer for this exchange.
    pub fn raw_text(&self) -> String {
        format!(
            "query: {}\nContext: {}\nResponse: {}",
            self.user_query, self.context_snapshot, self.response
        )
    }
}

// --- Personalization ---

/// What is known about a user across turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: String,
    #[serde(default)]
    pub personal_info: Vec<String>,
    /// Most-recent-relevant first, at most `memory.max_preferences` entries.
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub updated_at: String,
}

impl UserSummary {
    /// An empty summary for a user nothing is known about yet.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.personal_info.is_empty() && self.preferences.is_empty()
    }

    /// Drops preferences beyond `max`, keeping the leading (most relevant) entries.
    pub fn cap_preferences(&mut self, max: usize) {
        self.preferences.truncate(max);
    }

    /// JSON rendering of the two lists, as embedded in prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::json!({
            "personal_info": self.personal_info,
            "preferences": self.preferences,
        })
        .to_string()
    }
}

// --- Search ---

/// Which index a text search runs against.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchCollection {
    #[default]
    Products,
    Faq,
}

/// A scalar operand in a filter predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

/// Comparison operators for a single filter field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Predicate {
    #[serde(rename = "$eq", default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<FilterValue>,
    #[serde(rename = "$ne", default, skip_serializing_if = "Option::is_none")]
    pub ne: Option<FilterValue>,
    #[serde(rename = "$gt", default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<FilterValue>,
    #[serde(rename = "$gte", default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<FilterValue>,
    #[serde(rename = "$lt", default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<FilterValue>,
    #[serde(rename = "$lte", default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<FilterValue>,
    #[serde(rename = "$in", default, skip_serializing_if = "Option::is_none")]
    pub in_set: Option<Vec<FilterValue>>,
    #[serde(rename = "$nin", default, skip_serializing_if = "Option::is_none")]
    pub not_in_set: Option<Vec<FilterValue>>,
}

impl Predicate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Structured search filter. Only the fields listed here are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_average: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_level_1: Option<Predicate>,
    /// Estimated daily sales velocity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_score: Option<Predicate>,
}

impl SearchFilter {
    /// True when no field carries an operator.
    pub fn is_empty(&self) -> bool {
        [
            &self.brand,
            &self.rating_average,
            &self.price,
            &self.review_count,
            &self.category_level_1,
            &self.sold_score,
        ]
        .iter()
        .all(|p| p.as_ref().is_none_or(Predicate::is_empty))
    }
}

/// A text-embedding search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<SearchFilter>,
    pub collection: SearchCollection,
}

// --- Generation ---

/// A JSON schema the model output must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

/// A single-shot request to the generation model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_content: String,
    /// Structured output constraint; `None` requests free text.
    pub response_format: Option<ResponseSchema>,
}

/// The model's reply.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub content: String,
    pub model: String,
}

/// Removes a surrounding ```json ... ``` fence from model output, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_rejects_unknown_fields() {
        let json = r#"{"color": {"$eq": "black"}}"#;
        assert!(serde_json::from_str::<SearchFilter>(json).is_err());
    }

    #[test]
    fn predicate_rejects_unknown_operator() {
        let json = r#"{"price": {"$between": [1, 2]}}"#;
        assert!(serde_json::from_str::<SearchFilter>(json).is_err());
    }

    #[test]
    fn filter_parses_operator_keys() {
        let json = r#"{
            "price": {"$gte": 500000, "$lte": 2000000},
            "category_level_1": {"$in": ["Nhà Cửa - Đời Sống"]}
        }"#;
        let filter: SearchFilter = serde_json::from_str(json).unwrap();
        let price = filter.price.as_ref().unwrap();
        assert_eq!(price.gte, Some(FilterValue::Number(500000.0)));
        assert_eq!(price.lte, Some(FilterValue::Number(2000000.0)));
        assert_eq!(
            filter.category_level_1.unwrap().in_set,
            Some(vec![FilterValue::Text("Nhà Cửa - Đời Sống".into())])
        );
    }

    #[test]
    fn empty_filter_detection() {
        assert!(SearchFilter::default().is_empty());
        let only_empty = SearchFilter {
            brand: Some(Predicate::default()),
            ..SearchFilter::default()
        };
        assert!(only_empty.is_empty());
        let real = SearchFilter {
            brand: Some(Predicate {
                eq: Some(FilterValue::Text("Acme".into())),
                ..Predicate::default()
            }),
            ..SearchFilter::default()
        };
        assert!(!real.is_empty());
    }

    #[test]
    fn filter_serializes_without_absent_fields() {
        let filter = SearchFilter {
            rating_average: Some(Predicate {
                gte: Some(FilterValue::Number(4.0)),
                ..Predicate::default()
            }),
            ..SearchFilter::default()
        };
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(json, r#"{"rating_average":{"$gte":4.0}}"#);
    }

    #[test]
    fn collection_display_is_snake_case() {
        assert_eq!(SearchCollection::Products.to_string(), "products");
        assert_eq!(SearchCollection::Faq.to_string(), "faq");
    }

    #[test]
    fn raw_text_layout() {
        let exchange = Exchange {
            user_id: "u1".into(),
            conversation_id: None,
            user_query: "Giá bao nhiêu?".into(),
            image_ref: None,
            response: "199.000đ".into(),
            context_snapshot: "Relevant products: ...".into(),
            retrieved_items: vec![],
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        };
        assert_eq!(
            exchange.raw_text(),
            "query: Giá bao nhiêu?\nContext: Relevant products: ...\nResponse: 199.000đ"
        );
    }

    #[test]
    fn summary_caps_preferences() {
        let mut summary = UserSummary::empty("u1");
        summary.preferences = (0..15).map(|i| format!("pref {i}")).collect();
        summary.cap_preferences(10);
        assert_eq!(summary.preferences.len(), 10);
        assert_eq!(summary.preferences[0], "pref 0");
    }

    #[test]
    fn timestamp_format_is_parseable() {
        let ts = now_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}
