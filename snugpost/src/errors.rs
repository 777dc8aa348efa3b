use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by every engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No actor id was supplied with a mutating call.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Post, comment or reply id does not resolve to a stored record.
    #[error("target not found: {entity_id}")]
    TargetNotFound { entity_id: String },

    /// Optimistic retries on a contended document ran out.
    #[error("conflict retries exhausted after {attempts} attempts")]
    ConflictExhausted { attempts: u32 },

    /// Transport or backend failure talking to the store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] redis::RedisError),

    /// Actor is authenticated but may not perform this mutation.
    #[error("forbidden: {reason}")]
    Forbidden { reason: Cow<'static, str> },

    /// Invalid input supplied to an engine operation.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Insert collided with an existing record.
    #[error("entity already exists: {entity_id}")]
    AlreadyExists { entity_id: String },

    /// Version guard detected a stale read.
    #[error("version conflict (expected {expected}, actual {actual:?})")]
    VersionConflict { expected: u64, actual: Option<u64> },

    /// Malformed store response or serialization failure.
    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl EngineError {
    pub fn not_found(entity_id: impl Into<String>) -> Self {
        Self::TargetNotFound {
            entity_id: entity_id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub(crate) fn serialization(context: &str, err: serde_json::Error) -> Self {
        Self::Other {
            message: Cow::Owned(format!("failed to {context}: {err}")),
        }
    }

    /// Whether the failure is worth surfacing as "try again" to a user.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConflictExhausted { .. } | Self::StoreUnavailable(_) | Self::VersionConflict { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
