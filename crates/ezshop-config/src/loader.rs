// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ezshop.toml` > `~/.config/ezshop/ezshop.toml` > `/etc/ezshop/ezshop.toml`
//! with environment variable overrides via `EZSHOP_` prefix.

// figment::Error is external and cannot be boxed without a wrapper.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::EzshopConfig;

/// Section names that `EZSHOP_<SECTION>_<KEY>` variables are split on.
const SECTIONS: &[&str] = &[
    "agent",
    "openai",
    "search",
    "object_store",
    "storage",
    "memory",
    "retry",
    "gateway",
    "prometheus",
];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/ezshop/ezshop.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "ezshop.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("ezshop/ezshop.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ezshop/ezshop.toml` (system-wide)
/// 3. `~/.config/ezshop/ezshop.toml` (user XDG config)
/// 4. `./ezshop.toml` (local directory)
/// 5. `EZSHOP_*` environment variables
pub fn load_config() -> Result<EzshopConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<EzshopConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EzshopConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EzshopConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EzshopConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(EzshopConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")`: `EZSHOP_OBJECT_STORE_SECRET_ACCESS_KEY`
/// must map to `object_store.secret_access_key`, not `object.store.secret.access.key`.
fn env_provider() -> Env {
    Env::prefixed("EZSHOP_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
fn map_env_key(key: &str) -> String {
    // Longest section first so `object_store_` wins over any shorter prefix.
    let mut sections = SECTIONS.to_vec();
    sections.sort_by_key(|s| std::cmp::Reverse(s.len()));
    for section in sections {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("agent_look_back"), "agent.look_back");
        assert_eq!(map_env_key("openai_api_key"), "openai.api_key");
        assert_eq!(
            map_env_key("object_store_secret_access_key"),
            "object_store.secret_access_key"
        );
        assert_eq!(
            map_env_key("memory_rate_limit_calls"),
            "memory.rate_limit_calls"
        );
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("ezshop.toml", "[agent]\nlook_back = 3\n")?;
            jail.set_env("EZSHOP_AGENT_LOOK_BACK", "7");
            jail.set_env("EZSHOP_GATEWAY_PORT", "9100");
            let config = load_config_from_path(Path::new("ezshop.toml"))?;
            assert_eq!(config.agent.look_back, 7);
            assert_eq!(config.gateway.port, 9100);
            Ok(())
        });
    }

    #[test]
    fn upper_case_env_names_reach_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("ezshop.toml", "")?;
            jail.set_env("EZSHOP_OPENAI_MODEL", "gpt-4o");
            jail.set_env("EZSHOP_OBJECT_STORE_SECRET_ACCESS_KEY", "secret");
            let config = load_config_from_path(Path::new("ezshop.toml"))?;
            assert_eq!(config.openai.model, "gpt-4o");
            assert_eq!(
                config.object_store.secret_access_key.as_deref(),
                Some("secret")
            );
            Ok(())
        });
    }
}
