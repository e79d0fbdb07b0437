use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_endpoint() -> String {
    "https://api.scryfall.com/cards/named".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LookupConfig {
    /// Fuzzy-name lookup endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Whole-request timeout, surfaced as a service error when exceeded
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl LookupConfig {
    pub fn new() -> Self {
        let endpoint = env::var("LOOKUP_ENDPOINT").unwrap_or_else(|_| default_endpoint());

        let timeout_ms = env::var("LOOKUP_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_timeout_ms);

        Self {
            endpoint,
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
