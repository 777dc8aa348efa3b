//! Counter consistency layer.
//!
//! Counters are never written as absolute values. Every change is a relative
//! delta applied by the store (`JSON.NUMINCRBY` under Redis), either on its
//! own or staged into the same plan as the structural change it accounts for.
//! Reaction toggles move like/dislike counters through the same store-side
//! delta inside their toggle command.

use log::debug;

use crate::{
    config::Namespace,
    errors::{EngineError, EngineResult},
    keys::{COMMENTS, POSTS},
    runtime::{
        DocumentStore,
        commands::{CounterIncrement, MutationCommand, MutationPlan},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    PostLikes,
    PostDislikes,
    PostComments,
    PostShares,
    CommentLikes,
    CommentDislikes,
}

impl CounterField {
    pub fn field_name(self) -> &'static str {
        match self {
            Self::PostLikes => "likeCount",
            Self::PostDislikes => "dislikeCount",
            Self::PostComments => "commentCount",
            Self::PostShares => "shareCount",
            Self::CommentLikes => "likesCount",
            Self::CommentDislikes => "dislikesCount",
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            Self::PostLikes | Self::PostDislikes | Self::PostComments | Self::PostShares => POSTS,
            Self::CommentLikes | Self::CommentDislikes => COMMENTS,
        }
    }
}

#[derive(Clone)]
pub struct Counters<S> {
    store: S,
    namespace: Namespace,
}

impl<S> Counters<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    fn command(&self, target_id: &str, field: CounterField, delta: i64, expected_version: Option<u64>) -> MutationCommand {
        MutationCommand::IncrementCounter(CounterIncrement {
            key: self.namespace.keys().entity(field.collection(), target_id),
            entity_id: target_id.to_string(),
            field: field.field_name().to_string(),
            delta,
            expected_version,
        })
    }

    /// Adds a counter delta to a plan that carries the matching structural change.
    pub fn stage(&self, plan: &mut MutationPlan, target_id: &str, field: CounterField, delta: i64) {
        plan.push(self.command(target_id, field, delta, None));
    }

    /// Like [`Counters::stage`], but the plan fails if the target moved past `expected_version`.
    pub fn stage_guarded(
        &self,
        plan: &mut MutationPlan,
        target_id: &str,
        field: CounterField,
        delta: i64,
        expected_version: u64,
    ) {
        plan.push(self.command(target_id, field, delta, Some(expected_version)));
    }

    /// Applies a standalone delta and returns the counter's new value.
    pub async fn increment(&self, target_id: &str, field: CounterField, delta: i64) -> EngineResult<i64> {
        if delta == 0 {
            return Err(EngineError::invalid("counter delta must be non-zero"));
        }
        let mut plan = MutationPlan::new();
        self.stage(&mut plan, target_id, field, delta);
        let responses = self.store.apply(&plan).await?;
        let value = responses
            .first()
            .and_then(|response| response.get("value"))
            .and_then(serde_json::Value::as_i64)
            .unwrap_or_default();
        debug!("{} {} {delta:+} -> {value}", target_id, field.field_name());
        Ok(value)
    }
}
