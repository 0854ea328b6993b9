// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the EZShop assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level EZShop configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EzshopConfig {
    /// Assistant identity and turn settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Generation model settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Embedding/search service endpoints.
    #[serde(default)]
    pub search: SearchConfig,

    /// Image upload bucket.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// SQLite history log and summary repository.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Personalization cache and summarizer throttling.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Retry policy for transient provider failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Prometheus exporter.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Assistant identity and per-turn behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name, used in logs and the health endpoint.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of recent exchanges loaded as short-term memory.
    #[serde(default = "default_look_back")]
    pub look_back: i64,

    /// User query recorded for image turns that carry no text.
    #[serde(default = "default_image_query_fallback")]
    pub image_query_fallback: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            look_back: default_look_back(),
            image_query_fallback: default_image_query_fallback(),
        }
    }
}

fn default_agent_name() -> String {
    "ezshop".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_look_back() -> i64 {
    5
}

fn default_image_query_fallback() -> String {
    "Tìm sản phẩm bằng hình".to_string()
}

/// Generation model (OpenAI-compatible chat completions) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat completions endpoint.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used for routing and reply synthesis.
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for the user summary.
    #[serde(default = "default_summary_model")]
    pub summary_model: String,

    /// Per-request deadline.
    #[serde(default = "default_openai_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on generated tokens per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_model(),
            summary_model: default_summary_model(),
            timeout_secs: default_openai_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl OpenAiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini-2024-07-18".to_string()
}

fn default_summary_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1024
}

/// Embedding/search service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Text-embedding search endpoint (JSON body).
    #[serde(default = "default_text_url")]
    pub text_url: String,

    /// Image-similarity search endpoint (multipart body).
    #[serde(default = "default_image_url")]
    pub image_url: String,

    /// Per-request deadline.
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            text_url: default_text_url(),
            image_url: default_image_url(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_text_url() -> String {
    "http://127.0.0.1:8001/search/text".to_string()
}

fn default_image_url() -> String {
    "http://127.0.0.1:8001/search/image".to_string()
}

fn default_search_timeout_secs() -> u64 {
    15
}

/// S3-compatible object store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectStoreConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Key prefix for uploaded images.
    #[serde(default = "default_folder")]
    pub folder: String,

    /// Override for the S3 endpoint (e.g. a MinIO instance). `None` uses AWS.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Base of the returned public URL. `None` uses the virtual-hosted AWS URL.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// `None` falls back to the `AWS_ACCESS_KEY` environment variable.
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// `None` falls back to the `AWS_SECRET_KEY` environment variable.
    #[serde(default)]
    pub secret_access_key: Option<String>,

    #[serde(default = "default_object_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            folder: default_folder(),
            endpoint: None,
            public_base_url: None,
            access_key_id: None,
            secret_access_key: None,
            timeout_secs: default_object_store_timeout_secs(),
        }
    }
}

impl ObjectStoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_bucket() -> String {
    "ezshop-bucket".to_string()
}

fn default_region() -> String {
    "ap-southeast-2".to_string()
}

fn default_folder() -> String {
    "search-uploads".to_string()
}

fn default_object_store_timeout_secs() -> u64 {
    20
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("ezshop").join("ezshop.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("ezshop.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Personalization memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Lifetime of cached summaries and dedup markers.
    #[serde(default = "default_summary_ttl_secs")]
    pub summary_ttl_secs: u64,

    /// Upper bound on retained preferences per user.
    #[serde(default = "default_max_preferences")]
    pub max_preferences: usize,

    /// Summarizer calls allowed per window, shared across all requests.
    #[serde(default = "default_rate_limit_calls")]
    pub rate_limit_calls: u32,

    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            summary_ttl_secs: default_summary_ttl_secs(),
            max_preferences: default_max_preferences(),
            rate_limit_calls: default_rate_limit_calls(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
        }
    }
}

impl MemoryConfig {
    pub fn summary_ttl(&self) -> Duration {
        Duration::from_secs(self.summary_ttl_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }
}

fn default_summary_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_preferences() -> usize {
    10
}

fn default_rate_limit_calls() -> u32 {
    10
}

fn default_rate_limit_window_ms() -> u64 {
    1000
}

/// Exponential backoff for transient provider errors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_multiplier() -> f64 {
    2.0
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted image upload.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Deadline for a whole turn, from request to reply.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    #[serde(default = "default_prometheus_enabled")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: default_prometheus_enabled(),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    true
}
