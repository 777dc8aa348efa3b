//! snugpost: posts, threaded comments and like/dislike reactions on Redis Stack.
//!
//! Every write is a [`runtime::commands::MutationPlan`] applied atomically by a
//! [`runtime::DocumentStore`]: a Lua script over RedisJSON in production, or the
//! in-process [`runtime::MemoryStore`] with identical semantics.

pub mod audit;
pub mod config;
pub mod counters;
pub mod engine;
pub mod errors;
pub mod id;
pub mod keys;
pub mod reaction;
pub mod repository;
pub mod runtime;
pub mod types;

pub use audit::{AuditReport, CounterAuditor, CounterDrift};
pub use config::{EngineConfig, Namespace, RetryPolicy};
pub use counters::{CounterField, Counters};
pub use engine::{ReactionEngine, ReplyTreeUpdater, ShareChainResolver, SocialEngine, resolve_origin};
pub use errors::*;
pub use reaction::{Reactable, ReactionOutcome, ReactionTransition};
pub use repository::ContentStore;
pub use runtime::{DocumentStore, MemoryStore, RedisStore};
pub use types::{Actor, AuthorSnapshot, Comment, Origin, Post, ReactionFields, ReactionKind, Reply, Target};

// Re-export redis so callers can build a ConnectionManager without pinning a version
pub use redis;
pub use redis::aio::ConnectionManager;

/// Delete all keys matching a pattern (for test cleanup).
///
/// This performs a SCAN + DEL operation to safely delete keys without blocking Redis.
pub async fn cleanup_pattern(conn: &mut ConnectionManager, pattern: &str) -> Result<u64, EngineError> {
    const SCAN_COUNT: usize = 1000;
    let mut cursor: u64 = 0;
    let mut total_deleted: u64 = 0;

    loop {
        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_COUNT)
            .query_async(conn)
            .await?;

        if !keys.is_empty() {
            let deleted: u64 = redis::cmd("DEL").arg(&keys).query_async(conn).await?;
            total_deleted += deleted;
        }

        cursor = next_cursor;
        if cursor == 0 {
            break;
        }
    }

    Ok(total_deleted)
}
