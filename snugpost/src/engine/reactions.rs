use log::debug;

use crate::{
    config::Namespace,
    errors::{EngineError, EngineResult},
    reaction::ReactionOutcome,
    runtime::{
        DocumentStore,
        commands::{MutationCommand, MutationPlan, ReactionToggle},
    },
    types::{Actor, ReactionKind, Target},
};

/// Like/dislike toggles on posts and comments.
///
/// Each toggle is a single store-side command: the actor's reaction slot,
/// both sets and both counters move together, so concurrent toggles by other
/// actors on the same target never interfere.
#[derive(Clone)]
pub struct ReactionEngine<S> {
    store: S,
    namespace: Namespace,
}

impl<S> ReactionEngine<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    pub async fn toggle(&self, target: &Target, actor: &Actor, kind: ReactionKind) -> EngineResult<ReactionOutcome> {
        let actor_id = actor.require_id()?;
        let keys = self.namespace.keys();

        let mut plan = MutationPlan::new();
        plan.push(MutationCommand::ToggleReaction(ReactionToggle {
            key: keys.entity(target.collection(), target.id()),
            entity_id: target.id().to_string(),
            reactions_key: keys.reactions(target.id()),
            actor_id: actor_id.to_string(),
            kind,
            fields: target.reaction_fields(),
        }));

        let mut responses = self.store.apply(&plan).await?;
        let response = responses.pop().ok_or_else(|| EngineError::Other {
            message: "empty reaction response".into(),
        })?;
        let outcome: ReactionOutcome = serde_json::from_value(response)
            .map_err(|err| EngineError::serialization("decode reaction outcome", err))?;
        debug!(
            "{} {:?} on {}: {:?} -> {:?}",
            actor_id,
            kind,
            target.id(),
            outcome.previous,
            outcome.current
        );
        Ok(outcome)
    }

    /// The reaction an actor currently holds on a target.
    pub async fn reaction_of(&self, target: &Target, actor_id: &str) -> EngineResult<Option<ReactionKind>> {
        self.store
            .reaction(&self.namespace.keys().reactions(target.id()), actor_id)
            .await
    }
}
