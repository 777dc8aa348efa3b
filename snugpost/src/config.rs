use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    errors::{EngineError, EngineResult},
    keys::KeyContext,
};

/// Engine settings, usually loaded from the `[engine]` table of `snugpost.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            service: default_service(),
            retry: RetryPolicy::default(),
        }
    }
}

fn default_prefix() -> String {
    "snug".to_string()
}

fn default_service() -> String {
    "social".to_string()
}

impl EngineConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        toml::from_str(content).map_err(|err| EngineError::invalid(format!("invalid engine config: {err}")))
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| EngineError::invalid(format!("failed to read {}: {err}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn namespace(&self) -> Namespace {
        Namespace {
            prefix: self.prefix.clone(),
            service: self.service.clone(),
        }
    }
}

/// Owned key namespace handed to every engine component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: String,
    pub service: String,
}

impl Namespace {
    pub fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix, &self.service)
    }
}

/// Optimistic retry budget for read-modify-write on embedded reply arrays.
///
/// Attempt `n` (1-based) that loses a version race sleeps
/// `min(base_delay_ms * 2^(n-1), max_delay_ms)` before re-reading. After
/// `max_attempts` lost races the operation fails with `ConflictExhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    8
}

fn default_base_delay_ms() -> u64 {
    5
}

fn default_max_delay_ms() -> u64 {
    200
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}
