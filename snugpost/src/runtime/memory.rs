use std::{
    borrow::Cow,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::{Value, json};

use crate::{
    errors::{EngineError, EngineResult},
    runtime::{
        DocumentStore,
        commands::{MutationCommand, MutationPlan},
    },
    types::ReactionKind,
};

/// In-process store with the same plan semantics as the Lua script.
///
/// Each plan is applied to a staged copy under one lock and committed only if
/// every command succeeds. Reads yield to the scheduler first so concurrent
/// read-modify-write callers actually interleave.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Clone, Default)]
struct MemoryState {
    documents: HashMap<String, Value>,
    indexes: HashMap<String, Vec<String>>,
    reactions: HashMap<String, HashMap<String, ReactionKind>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| EngineError::Other {
            message: Cow::Borrowed("memory store lock poisoned"),
        })
    }

    /// Overwrites a raw document, bypassing plans. Test hook for simulating drift.
    pub fn put_raw(&self, key: &str, document: Value) -> EngineResult<()> {
        self.lock()?.documents.insert(key.to_string(), document);
        Ok(())
    }

    pub fn document_count(&self) -> EngineResult<usize> {
        Ok(self.lock()?.documents.len())
    }
}

impl DocumentStore for MemoryStore {
    async fn fetch(&self, key: &str) -> EngineResult<Option<Value>> {
        tokio::task::yield_now().await;
        Ok(self.lock()?.documents.get(key).cloned())
    }

    async fn fetch_many(&self, keys: &[String]) -> EngineResult<Vec<Option<Value>>> {
        tokio::task::yield_now().await;
        let state = self.lock()?;
        Ok(keys.iter().map(|key| state.documents.get(key).cloned()).collect())
    }

    async fn index(&self, index_key: &str) -> EngineResult<Vec<String>> {
        Ok(self.lock()?.indexes.get(index_key).cloned().unwrap_or_default())
    }

    async fn reaction(&self, reactions_key: &str, actor_id: &str) -> EngineResult<Option<ReactionKind>> {
        Ok(self
            .lock()?
            .reactions
            .get(reactions_key)
            .and_then(|slots| slots.get(actor_id))
            .copied())
    }

    async fn apply(&self, plan: &MutationPlan) -> EngineResult<Vec<Value>> {
        let mut state = self.lock()?;
        let mut staged = state.clone();
        let mut results = Vec::with_capacity(plan.len());
        for command in &plan.commands {
            results.push(staged.apply_command(command)?);
        }
        *state = staged;
        Ok(results)
    }
}

impl MemoryState {
    fn document_mut(&mut self, key: &str, entity_id: &str) -> EngineResult<&mut Value> {
        self.documents
            .get_mut(key)
            .ok_or_else(|| EngineError::not_found(entity_id))
    }

    fn apply_command(&mut self, command: &MutationCommand) -> EngineResult<Value> {
        match command {
            MutationCommand::InsertDocument(insert) => {
                if self.documents.contains_key(&insert.key) {
                    return Err(EngineError::AlreadyExists {
                        entity_id: insert.entity_id.clone(),
                    });
                }
                let document: Value = serde_json::from_str(&insert.payload_json)
                    .map_err(|err| EngineError::serialization("parse document payload", err))?;
                self.documents.insert(insert.key.clone(), document);
                Ok(json!({"ok": true, "entity_id": insert.entity_id}))
            }
            MutationCommand::DeleteDocument(delete) => {
                if self.documents.remove(&delete.key).is_none() {
                    return Err(EngineError::not_found(&delete.entity_id));
                }
                if let Some(reactions_key) = &delete.reactions_key {
                    self.reactions.remove(reactions_key);
                }
                Ok(json!({"ok": true}))
            }
            MutationCommand::IncrementCounter(increment) => {
                let document = self.document_mut(&increment.key, &increment.entity_id)?;
                if let Some(expected) = increment.expected_version {
                    check_version(document, expected)?;
                }
                let value = bump(document, &increment.field, increment.delta);
                bump(document, "version", 1);
                Ok(json!({"ok": true, "value": value}))
            }
            MutationCommand::ToggleReaction(toggle) => {
                let fields = toggle.fields;
                let stored = self
                    .reactions
                    .get(&toggle.reactions_key)
                    .and_then(|slots| slots.get(&toggle.actor_id))
                    .copied();
                let document = self.document_mut(&toggle.key, &toggle.entity_id)?;
                let previous = stored.or_else(|| {
                    if set_contains(document, fields.liked_by, &toggle.actor_id) {
                        Some(ReactionKind::Like)
                    } else if set_contains(document, fields.disliked_by, &toggle.actor_id) {
                        Some(ReactionKind::Dislike)
                    } else {
                        None
                    }
                });
                let current = if previous == Some(toggle.kind) {
                    None
                } else {
                    Some(toggle.kind)
                };

                for (kind, count_field, set_field) in [
                    (ReactionKind::Like, fields.like_count, fields.liked_by),
                    (ReactionKind::Dislike, fields.dislike_count, fields.disliked_by),
                ] {
                    let delta = i64::from(current == Some(kind)) - i64::from(previous == Some(kind));
                    if delta == 1 && set_add(document, set_field, &toggle.actor_id) {
                        bump(document, count_field, 1);
                    } else if delta == -1 && set_remove(document, set_field, &toggle.actor_id) {
                        bump(document, count_field, -1);
                    }
                }
                bump(document, "version", 1);
                let likes = counter(document, fields.like_count);
                let dislikes = counter(document, fields.dislike_count);

                let slots = self.reactions.entry(toggle.reactions_key.clone()).or_default();
                match current {
                    Some(kind) => {
                        slots.insert(toggle.actor_id.clone(), kind);
                    }
                    None => {
                        slots.remove(&toggle.actor_id);
                    }
                }

                Ok(json!({
                    "ok": true,
                    "previous": previous,
                    "current": current,
                    "likes": likes,
                    "dislikes": dislikes,
                }))
            }
            MutationCommand::AddToSet(add) => {
                let document = self.document_mut(&add.key, &add.entity_id)?;
                let added = set_add(document, &add.field, &add.member);
                if added {
                    bump(document, "version", 1);
                }
                Ok(json!({"ok": true, "added": added}))
            }
            MutationCommand::ReplaceField(replace) => {
                let document = self.document_mut(&replace.key, &replace.entity_id)?;
                check_version(document, replace.expected_version)?;
                let value: Value = serde_json::from_str(&replace.value_json)
                    .map_err(|err| EngineError::serialization("parse field value", err))?;
                if let Some(object) = document.as_object_mut() {
                    object.insert(replace.field.clone(), value);
                }
                let version = bump(document, "version", 1);
                Ok(json!({"ok": true, "version": version}))
            }
            MutationCommand::AppendIndex(append) => {
                self.indexes
                    .entry(append.index_key.clone())
                    .or_default()
                    .push(append.member.clone());
                Ok(json!({"ok": true}))
            }
            MutationCommand::RemoveIndex(remove) => {
                let members = self.indexes.entry(remove.index_key.clone()).or_default();
                let before = members.len();
                members.retain(|member| member != &remove.member);
                Ok(json!({"ok": true, "removed": before - members.len()}))
            }
        }
    }
}

fn check_version(document: &Value, expected: u64) -> EngineResult<()> {
    let actual = document.get("version").and_then(Value::as_u64).unwrap_or_default();
    if actual != expected {
        return Err(EngineError::VersionConflict {
            expected,
            actual: Some(actual),
        });
    }
    Ok(())
}

fn counter(document: &Value, field: &str) -> i64 {
    document.get(field).and_then(Value::as_i64).unwrap_or_default()
}

fn bump(document: &mut Value, field: &str, delta: i64) -> i64 {
    let next = counter(document, field) + delta;
    if let Some(object) = document.as_object_mut() {
        object.insert(field.to_string(), json!(next));
    }
    next
}

fn set_contains(document: &Value, field: &str, member: &str) -> bool {
    document
        .get(field)
        .and_then(Value::as_array)
        .is_some_and(|members| members.iter().any(|value| value.as_str() == Some(member)))
}

fn set_add(document: &mut Value, field: &str, member: &str) -> bool {
    if set_contains(document, field, member) {
        return false;
    }
    let Some(object) = document.as_object_mut() else {
        return false;
    };
    let entry = object.entry(field.to_string()).or_insert_with(|| json!([]));
    if !entry.is_array() {
        *entry = json!([]);
    }
    if let Some(members) = entry.as_array_mut() {
        members.push(Value::String(member.to_string()));
    }
    true
}

fn set_remove(document: &mut Value, field: &str, member: &str) -> bool {
    let Some(members) = document.get_mut(field).and_then(Value::as_array_mut) else {
        return false;
    };
    let before = members.len();
    members.retain(|value| value.as_str() != Some(member));
    before != members.len()
}
