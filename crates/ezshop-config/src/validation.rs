// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express. All violations are
//! collected before returning so the operator sees every problem at once.

use crate::diagnostic::ConfigError;
use crate::model::EzshopConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &EzshopConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::invalid(
            "agent.log_level",
            format!("`{}` is not one of {}", config.agent.log_level, LOG_LEVELS.join(", ")),
        ));
    }

    if config.agent.look_back <= 0 {
        errors.push(ConfigError::invalid(
            "agent.look_back",
            format!("must be greater than 0, got {}", config.agent.look_back),
        ));
    }

    for (key, url) in [
        ("openai.base_url", &config.openai.base_url),
        ("search.text_url", &config.search.text_url),
        ("search.image_url", &config.search.image_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::invalid(key, format!("`{url}` is not an http(s) URL")));
        }
    }

    for (key, secs) in [
        ("openai.timeout_secs", config.openai.timeout_secs),
        ("search.timeout_secs", config.search.timeout_secs),
        ("object_store.timeout_secs", config.object_store.timeout_secs),
        ("gateway.request_timeout_secs", config.gateway.request_timeout_secs),
    ] {
        if secs == 0 {
            errors.push(ConfigError::invalid(key, "deadline must be at least 1 second"));
        }
    }

    if config.object_store.bucket.trim().is_empty() {
        errors.push(ConfigError::invalid("object_store.bucket", "must not be empty"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path", "must not be empty"));
    }

    if config.memory.max_preferences == 0 {
        errors.push(ConfigError::invalid("memory.max_preferences", "must be at least 1"));
    }

    if config.memory.rate_limit_calls == 0 || config.memory.rate_limit_window_ms == 0 {
        errors.push(ConfigError::invalid(
            "memory.rate_limit_calls",
            "rate limit needs a positive call budget and window",
        ));
    }

    if config.retry.max_attempts == 0 {
        errors.push(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
    }

    if config.retry.multiplier < 1.0 {
        errors.push(ConfigError::invalid(
            "retry.multiplier",
            format!("must be >= 1.0, got {}", config.retry.multiplier),
        ));
    }

    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(ConfigError::invalid(
            "retry.base_delay_ms",
            format!(
                "base delay {}ms exceeds max delay {}ms",
                config.retry.base_delay_ms, config.retry.max_delay_ms
            ),
        ));
    }

    if config.gateway.host.parse::<std::net::IpAddr>().is_err()
        && !config
            .gateway
            .host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::invalid(
            "gateway.host",
            format!("`{}` is not an IP address or hostname", config.gateway.host),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
