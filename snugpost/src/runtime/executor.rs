use std::{borrow::Cow, future::Future};

use log::debug;
use redis::{AsyncCommands, aio::ConnectionManager, cmd};
use serde_json::Value;

use crate::{
    errors::{EngineError, EngineResult},
    runtime::{commands::MutationPlan, scripts::MUTATION_PLAN_SCRIPT},
    types::ReactionKind,
};

/// A transactional JSON document store.
///
/// `apply` is the only write path: a store must either apply every command in
/// the plan or none of them, and must serialize plans touching the same keys.
pub trait DocumentStore: Send + Sync {
    fn fetch(&self, key: &str) -> impl Future<Output = EngineResult<Option<Value>>> + Send;

    fn fetch_many(&self, keys: &[String]) -> impl Future<Output = EngineResult<Vec<Option<Value>>>> + Send;

    /// Members of an ordered index, oldest first.
    fn index(&self, index_key: &str) -> impl Future<Output = EngineResult<Vec<String>>> + Send;

    /// The reaction slot an actor holds on a target, if any.
    fn reaction(
        &self,
        reactions_key: &str,
        actor_id: &str,
    ) -> impl Future<Output = EngineResult<Option<ReactionKind>>> + Send;

    fn apply(&self, plan: &MutationPlan) -> impl Future<Output = EngineResult<Vec<Value>>> + Send;
}

/// Maps a store response onto per-command results or a typed error.
pub fn decode_plan_response(value: Value) -> EngineResult<Vec<Value>> {
    if let Some(error) = value.get("error") {
        let Some(code) = error.as_str() else {
            return Err(EngineError::Other {
                message: Cow::Borrowed("lua_error"),
            });
        };
        return Err(match code {
            "version_conflict" => EngineError::VersionConflict {
                expected: value.get("expected").and_then(Value::as_u64).unwrap_or_default(),
                actual: value.get("actual").and_then(Value::as_u64),
            },
            "entity_not_found" => EngineError::not_found(string_field(&value, "entity_id")),
            "already_exists" => EngineError::AlreadyExists {
                entity_id: string_field(&value, "entity_id"),
            },
            other => EngineError::Other {
                message: Cow::Owned(other.to_string()),
            },
        });
    }

    Ok(value
        .get("results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default())
}

fn string_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Redis Stack backed store: RedisJSON documents, list indexes, hash reaction slots.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(url: &str) -> EngineResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

fn parse_document(json: &str) -> EngineResult<Value> {
    serde_json::from_str(json).map_err(|err| EngineError::serialization("parse stored document", err))
}

impl DocumentStore for RedisStore {
    async fn fetch(&self, key: &str) -> EngineResult<Option<Value>> {
        let mut conn = self.conn.clone();
        let result: Option<String> = cmd("JSON.GET").arg(key).query_async(&mut conn).await?;
        result.as_deref().map(parse_document).transpose()
    }

    async fn fetch_many(&self, keys: &[String]) -> EngineResult<Vec<Option<Value>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let raw: Vec<Option<String>> = cmd("JSON.MGET").arg(keys).arg("$").query_async(&mut conn).await?;
        raw.into_iter()
            .map(|entry| match entry {
                // `$` paths wrap each match in an array
                Some(json) => match parse_document(&json)? {
                    Value::Array(mut matches) if !matches.is_empty() => Ok(Some(matches.swap_remove(0))),
                    _ => Ok(None),
                },
                None => Ok(None),
            })
            .collect()
    }

    async fn index(&self, index_key: &str) -> EngineResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.lrange(index_key, 0, -1).await?;
        Ok(members)
    }

    async fn reaction(&self, reactions_key: &str, actor_id: &str) -> EngineResult<Option<ReactionKind>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(reactions_key, actor_id).await?;
        Ok(match raw.as_deref() {
            Some("like") => Some(ReactionKind::Like),
            Some("dislike") => Some(ReactionKind::Dislike),
            _ => None,
        })
    }

    async fn apply(&self, plan: &MutationPlan) -> EngineResult<Vec<Value>> {
        if plan.is_empty() {
            return Ok(Vec::new());
        }
        let payload =
            serde_json::to_string(plan).map_err(|err| EngineError::serialization("serialize mutation plan", err))?;
        debug!("applying mutation plan with {} commands", plan.len());

        let mut conn = self.conn.clone();
        let mut invocation = MUTATION_PLAN_SCRIPT.prepare_invoke();
        invocation.arg(payload);
        let raw: String = invocation.invoke_async(&mut conn).await?;

        let value: Value = serde_json::from_str(&raw).map_err(|err| EngineError::Other {
            message: Cow::Owned(format!("failed to parse lua response: {err}")),
        })?;
        decode_plan_response(value)
    }
}
