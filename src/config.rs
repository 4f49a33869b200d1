//! Environment-driven service configuration.

use std::env;
use std::str::FromStr;
use tracing::{info, warn};

use crate::pipeline::{DEFAULT_MAX_COMMENTS, DEFAULT_SAMPLE_LIMIT};
use crate::sarcasm::SarcasmConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub youtube_api_key: Option<String>,
    pub max_comments: usize,
    pub sample_limit: usize,
    pub sarcasm: SarcasmConfig,
    /// `None` allows any origin.
    pub cors_allow_origins: Option<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            youtube_api_key: None,
            max_comments: DEFAULT_MAX_COMMENTS,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            sarcasm: SarcasmConfig::default(),
            cors_allow_origins: None,
        }
    }
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or invalid values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let youtube_api_key = lookup("YOUTUBE_API_KEY").filter(|k| !k.trim().is_empty());
        if youtube_api_key.is_none() {
            warn!("🔑 YOUTUBE_API_KEY not set. Comment fetching is disabled; metadata uses oEmbed.");
        }

        let sarcasm = match lookup("SARCASM_LEXICON").filter(|p| !p.trim().is_empty()) {
            Some(path) => match SarcasmConfig::from_json_file(&path) {
                Ok(config) => {
                    info!("🧾 Loaded {} sarcasm cues from {}", config.cues.len(), path);
                    config
                }
                Err(e) => {
                    warn!("⚠️ {:#}. Using built-in sarcasm cues.", e);
                    defaults.sarcasm
                }
            },
            None => defaults.sarcasm,
        };

        let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty() && !origins.iter().any(|o| o == "*"));

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            youtube_api_key,
            max_comments: parse_or(&lookup, "MAX_COMMENTS", defaults.max_comments),
            sample_limit: parse_or(&lookup, "SAMPLE_LIMIT", defaults.sample_limit),
            sarcasm,
            cors_allow_origins,
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("⚠️ Invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
