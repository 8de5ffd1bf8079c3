//! Configuration module for the partitioned similarity engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`wordshard.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `WS_` and use double
//! underscores to separate nested levels:
//! - `WS_DIMENSION=50` sets `dimension`
//! - `WS_LOAD__ON_MALFORMED=abort` sets `load.on_malformed`

use crate::embedding::{DEFAULT_DIMENSION, DEFAULT_MAX_WORD_LEN, MalformedRowPolicy};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "wordshard.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Embedding dimension; every vector in the table must match it
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Maximum word length in bytes; the wire format reserves this slot
    #[serde(default = "default_max_word_len")]
    pub max_word_len: usize,

    /// Number of workers the table is partitioned across
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How many results a query returns
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Bounded wait for any single worker reply, in milliseconds
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,

    /// Table loading behavior
    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoadConfig {
    /// What to do with rows that fail to parse
    #[serde(default)]
    pub on_malformed: MalformedRowPolicy,
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_max_word_len() -> usize {
    DEFAULT_MAX_WORD_LEN
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_top_k() -> usize {
    10
}

fn default_reply_timeout_ms() -> u64 {
    5000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            max_word_len: default_max_word_len(),
            workers: default_workers(),
            top_k: default_top_k(),
            reply_timeout_ms: default_reply_timeout_ms(),
            load: LoadConfig::default(),
        }
    }
}

impl Settings {
    /// Loads settings: defaults, then `wordshard.toml`, then `WS_` env vars.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(CONFIG_FILE))
            // Layer in environment variables with WS_ prefix
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed("WS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }
}
