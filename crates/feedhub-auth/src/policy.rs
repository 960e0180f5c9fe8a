//! Key sets and the rule that turns a presented key into an [`AccessLevel`].

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::warn;

use feedhub_core::config::auth::AuthConfig;
use feedhub_core::result::AppResult;

use crate::level::AccessLevel;

/// Tier resolution shared by every key source.
///
/// `key_tier` is the tier the presented key is registered under, if any.
/// The two flags say whether any read-only or read-write keys exist at all.
pub fn resolve_level(
    key_tier: Option<AccessLevel>,
    any_read_only: bool,
    any_read_write: bool,
) -> AccessLevel {
    if !any_read_only && !any_read_write {
        return AccessLevel::ReadWrite;
    }
    match key_tier {
        Some(AccessLevel::ReadWrite) => AccessLevel::ReadWrite,
        Some(AccessLevel::ReadOnly) => AccessLevel::ReadOnly,
        _ if !any_read_only => AccessLevel::ReadOnly,
        _ => AccessLevel::Denied,
    }
}

/// Something that can answer "what may this key do".
#[async_trait]
pub trait AccessResolver: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve the access level for a presented key (`""` when absent).
    async fn access_level(&self, key: &str) -> AppResult<AccessLevel>;
}

/// How open the feed is, for startup diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    /// No keys at all: anyone may read and push.
    Open,
    /// Only read-write keys: anyone may read.
    PublicRead,
    /// Reads require a key too.
    Restricted,
}

/// Read-only and read-write key sets loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    read_only: HashSet<String>,
    read_write: HashSet<String>,
}

impl AccessPolicy {
    /// Build a policy, dropping empty keys.
    ///
    /// A key listed in both sets is treated as read-write.
    pub fn new<I, J>(read_only: I, read_write: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        let read_write: HashSet<String> = read_write
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        let read_only: HashSet<String> = read_only
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .filter(|k| {
                let dup = read_write.contains(k);
                if dup {
                    warn!("API key listed as both read-only and read-write; treating it as read-write");
                }
                !dup
            })
            .collect();

        Self {
            read_only,
            read_write,
        }
    }

    /// Build a policy from the `[auth]` configuration section.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.read_only.clone(), config.read_write.clone())
    }

    /// Access level for a presented key.
    pub fn level(&self, key: &str) -> AccessLevel {
        let tier = if self.read_write.contains(key) {
            Some(AccessLevel::ReadWrite)
        } else if self.read_only.contains(key) {
            Some(AccessLevel::ReadOnly)
        } else {
            None
        };
        resolve_level(tier, !self.read_only.is_empty(), !self.read_write.is_empty())
    }

    pub fn mode(&self) -> PolicyMode {
        match (self.read_only.is_empty(), self.read_write.is_empty()) {
            (true, true) => PolicyMode::Open,
            (true, false) => PolicyMode::PublicRead,
            _ => PolicyMode::Restricted,
        }
    }
}

#[async_trait]
impl AccessResolver for AccessPolicy {
    async fn access_level(&self, key: &str) -> AppResult<AccessLevel> {
        Ok(self.level(key))
    }
}
