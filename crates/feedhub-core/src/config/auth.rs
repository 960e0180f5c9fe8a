//! API key configuration.

use serde::{Deserialize, Serialize};

/// API key settings.
///
/// With both key lists empty the feed runs open: anyone may read and push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Request header carrying the API key.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Where keys are resolved: `"config"` or `"document-store"`.
    #[serde(default = "default_key_source")]
    pub key_source: String,
    /// Keys granting read access.
    #[serde(default)]
    pub read_only: Vec<String>,
    /// Keys granting read and push access.
    #[serde(default)]
    pub read_write: Vec<String>,
    /// TTL for cached key lookups against the document store. `0` disables caching.
    #[serde(default)]
    pub cache_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_header: default_api_key_header(),
            key_source: default_key_source(),
            read_only: Vec::new(),
            read_write: Vec::new(),
            cache_ttl_seconds: 0,
        }
    }
}

fn default_api_key_header() -> String {
    "X-NuGet-ApiKey".to_string()
}

fn default_key_source() -> String {
    "config".to_string()
}
