//! Runtime configuration
//!
//! Engine settings are plain serde structs with defaults. The server reads
//! its settings from the environment after `dotenvy` has loaded `.env`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Settings the take-profit engine is constructed with
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EngineConfig {
    /// Most boundaries a single fulfillment pass will fill before deferring
    /// the rest to the next trade on the venue
    #[serde(default = "default_max_fills_per_pass")]
    pub max_fills_per_pass: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_fills_per_pass: default_max_fills_per_pass(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Buffered events per websocket topic
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,

    /// Create a funded ETH-USDC pool on startup
    #[serde(default = "default_true")]
    pub seed_demo_venue: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            engine: EngineConfig::default(),
            broadcast_capacity: default_broadcast_capacity(),
            seed_demo_venue: true,
        }
    }
}

impl AppConfig {
    /// Read `HOST`, `PORT`, `MAX_FILLS_PER_PASS`, `BROADCAST_CAPACITY` and
    /// `SEED_DEMO_VENUE`; unset or unparsable values keep their defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let max_fills_per_pass = parse_var(&lookup, "MAX_FILLS_PER_PASS")
            .filter(|max: &usize| *max > 0)
            .unwrap_or(defaults.engine.max_fills_per_pass);

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            engine: EngineConfig { max_fills_per_pass },
            broadcast_capacity: parse_var(&lookup, "BROADCAST_CAPACITY")
                .filter(|capacity: &usize| *capacity > 0)
                .unwrap_or(defaults.broadcast_capacity),
            seed_demo_venue: parse_var(&lookup, "SEED_DEMO_VENUE").unwrap_or(defaults.seed_demo_venue),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}

fn default_max_fills_per_pass() -> usize {
    64
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_broadcast_capacity() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.engine.max_fills_per_pass, 64);
        assert!(config.seed_demo_venue);
    }

    #[test]
    fn test_reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("MAX_FILLS_PER_PASS", "8"),
            ("SEED_DEMO_VENUE", "false"),
        ]));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.engine.max_fills_per_pass, 8);
        assert!(!config.seed_demo_venue);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("MAX_FILLS_PER_PASS", "0"),
        ]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.engine.max_fills_per_pass, 64);
    }

    #[test]
    fn test_engine_config_serde_default() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_fills_per_pass, 64);
    }
}
