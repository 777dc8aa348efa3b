use serde::Serialize;

use crate::{
    errors::{EngineError, EngineResult},
    types::{ReactionFields, ReactionKind},
};

/// One store-side step of a mutation plan.
///
/// Commands in a plan are validated together and then applied together: if
/// any precondition fails nothing in the plan is written.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationCommand {
    InsertDocument(DocumentInsert),
    DeleteDocument(DocumentDelete),
    IncrementCounter(CounterIncrement),
    ToggleReaction(ReactionToggle),
    AddToSet(SetAdd),
    ReplaceField(FieldReplace),
    AppendIndex(IndexAppend),
    RemoveIndex(IndexRemove),
}

/// Creates a document; fails with `already_exists` if the key is taken.
#[derive(Debug, Serialize)]
pub struct DocumentInsert {
    pub key: String,
    pub entity_id: String,
    pub payload_json: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentDelete {
    pub key: String,
    pub entity_id: String,
    /// Reaction records of the deleted target, dropped with it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions_key: Option<String>,
}

/// Store-applied relative delta on a numeric field.
#[derive(Debug, Serialize)]
pub struct CounterIncrement {
    pub key: String,
    pub entity_id: String,
    pub field: String,
    pub delta: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

/// Flips one actor's reaction slot and moves counters and sets with it.
#[derive(Debug, Serialize)]
pub struct ReactionToggle {
    pub key: String,
    pub entity_id: String,
    pub reactions_key: String,
    pub actor_id: String,
    pub kind: ReactionKind,
    pub fields: ReactionFields,
}

#[derive(Debug, Serialize)]
pub struct SetAdd {
    pub key: String,
    pub entity_id: String,
    pub field: String,
    pub member: String,
}

/// Whole-value overwrite of one field, guarded by the document version.
#[derive(Debug, Serialize)]
pub struct FieldReplace {
    pub key: String,
    pub entity_id: String,
    pub field: String,
    pub value_json: String,
    pub expected_version: u64,
}

#[derive(Debug, Serialize)]
pub struct IndexAppend {
    pub index_key: String,
    pub member: String,
}

#[derive(Debug, Serialize)]
pub struct IndexRemove {
    pub index_key: String,
    pub member: String,
}

#[derive(Debug, Serialize, Default)]
pub struct MutationPlan {
    pub commands: Vec<MutationCommand>,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: MutationCommand) {
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

pub fn build_document_insert<T>(key: String, entity_id: &str, document: &T) -> EngineResult<DocumentInsert>
where
    T: Serialize,
{
    let payload_json =
        serde_json::to_string(document).map_err(|err| EngineError::serialization("serialize document", err))?;
    Ok(DocumentInsert {
        key,
        entity_id: entity_id.to_string(),
        payload_json,
    })
}

pub fn build_field_replace<T>(
    key: String,
    entity_id: &str,
    field: &str,
    value: &T,
    expected_version: u64,
) -> EngineResult<FieldReplace>
where
    T: Serialize,
{
    let value_json =
        serde_json::to_string(value).map_err(|err| EngineError::serialization("serialize field value", err))?;
    Ok(FieldReplace {
        key,
        entity_id: entity_id.to_string(),
        field: field.to_string(),
        value_json,
        expected_version,
    })
}
