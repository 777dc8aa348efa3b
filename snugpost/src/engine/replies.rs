//! Mutations of the reply array embedded in a comment.
//!
//! Replies are not individually addressable: every mutation reads the whole
//! comment, rewrites the `replies` array and writes it back guarded by the
//! comment's version. Losing a version race is expected under contention and
//! is retried with exponential backoff per [`RetryPolicy`]; callers see
//! `ConflictExhausted` only once the whole budget is spent. Counter fields of
//! the comment itself are never touched by this path.
//!
//! Nesting is fixed at one level. Replying to a reply appends to the same
//! array with an `@name` prefix on the content.

use chrono::Utc;
use log::{debug, warn};

use crate::{
    config::{Namespace, RetryPolicy},
    errors::{EngineError, EngineResult},
    id::generate_entity_id,
    reaction::{Reactable, ReactionOutcome},
    repository::decode,
    runtime::{
        DocumentStore,
        commands::{MutationCommand, MutationPlan, build_field_replace},
    },
    types::{Actor, Comment, ReactionKind, Reply},
};

const REPLIES_FIELD: &str = "replies";

#[derive(Clone)]
pub struct ReplyTreeUpdater<S> {
    store: S,
    namespace: Namespace,
    retry: RetryPolicy,
}

impl<S> ReplyTreeUpdater<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, namespace: Namespace, retry: RetryPolicy) -> Self {
        Self {
            store,
            namespace,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn load(&self, post_id: &str, comment_id: &str) -> EngineResult<Comment> {
        let comment: Comment = self
            .store
            .fetch(&self.namespace.keys().comment(comment_id))
            .await?
            .map(decode)
            .transpose()?
            .ok_or_else(|| EngineError::not_found(comment_id))?;
        if comment.post_id != post_id {
            return Err(EngineError::not_found(comment_id));
        }
        Ok(comment)
    }

    /// Runs `transform` against a fresh read until its write lands.
    ///
    /// `transform` may run several times and must only depend on the comment
    /// it is handed. An error from it aborts without retrying.
    pub async fn update<F, R>(&self, post_id: &str, comment_id: &str, mut transform: F) -> EngineResult<(Comment, R)>
    where
        F: FnMut(&mut Comment) -> EngineResult<R> + Send,
        R: Send,
    {
        let attempts = self.retry.max_attempts.max(1);
        let key = self.namespace.keys().comment(comment_id);

        for attempt in 1..=attempts {
            let mut comment = self.load(post_id, comment_id).await?;
            let result = transform(&mut comment)?;

            let mut plan = MutationPlan::new();
            plan.push(MutationCommand::ReplaceField(build_field_replace(
                key.clone(),
                comment_id,
                REPLIES_FIELD,
                &comment.replies,
                comment.version,
            )?));

            match self.store.apply(&plan).await {
                Ok(responses) => {
                    comment.version = responses
                        .first()
                        .and_then(|response| response.get("version"))
                        .and_then(serde_json::Value::as_u64)
                        .unwrap_or(comment.version + 1);
                    return Ok((comment, result));
                }
                Err(EngineError::VersionConflict { expected, actual }) => {
                    debug!(
                        "reply write on {comment_id} lost race (attempt {attempt}/{attempts}, expected v{expected}, found {actual:?})"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        warn!("reply write on {comment_id} gave up after {attempts} attempts");
        Err(EngineError::ConflictExhausted { attempts })
    }

    /// Appends a reply. With `reply_to`, the reply answers another reply in
    /// the same list and is prefixed with `@{that author's name} `.
    pub async fn add_reply(
        &self,
        post_id: &str,
        comment_id: &str,
        actor: &Actor,
        content: &str,
        reply_to: Option<&str>,
    ) -> EngineResult<Reply> {
        actor.require_id()?;
        let content = content.trim();
        if content.is_empty() {
            return Err(EngineError::invalid("reply content must not be empty"));
        }

        let template = Reply {
            id: generate_entity_id(),
            post_id: post_id.to_string(),
            comment_id: comment_id.to_string(),
            author: actor.snapshot(),
            content: content.to_string(),
            created_at: Utc::now(),
            likes_count: 0,
            liked_by: Vec::new(),
            dislikes_count: 0,
            disliked_by: Vec::new(),
        };

        let (_, reply) = self
            .update(post_id, comment_id, |comment| {
                let mut reply = template.clone();
                if let Some(parent_id) = reply_to {
                    let parent = comment
                        .reply(parent_id)
                        .ok_or_else(|| EngineError::not_found(parent_id))?;
                    reply.content = format!("@{} {}", parent.author.author_name, reply.content);
                }
                comment.replies.push(reply.clone());
                Ok(reply)
            })
            .await?;
        debug!("reply {} appended to comment {comment_id}", reply.id);
        Ok(reply)
    }

    /// Applies the like/dislike toggle rule to one reply, leaving the rest untouched.
    pub async fn toggle_reaction(
        &self,
        post_id: &str,
        comment_id: &str,
        reply_id: &str,
        actor: &Actor,
        kind: ReactionKind,
    ) -> EngineResult<ReactionOutcome> {
        let actor_id = actor.require_id()?;
        let (_, outcome) = self
            .update(post_id, comment_id, |comment| {
                let reply = comment
                    .replies
                    .iter_mut()
                    .find(|reply| reply.id == reply_id)
                    .ok_or_else(|| EngineError::not_found(reply_id))?;
                let transition = reply.toggle(actor_id, kind);
                Ok(reply.outcome(transition))
            })
            .await?;
        Ok(outcome)
    }

    /// Removes a reply. Allowed to the reply's author and the comment's author.
    pub async fn remove_reply(
        &self,
        post_id: &str,
        comment_id: &str,
        reply_id: &str,
        actor: &Actor,
    ) -> EngineResult<Reply> {
        let actor_id = actor.require_id()?;
        let (_, removed) = self
            .update(post_id, comment_id, |comment| {
                let position = comment
                    .replies
                    .iter()
                    .position(|reply| reply.id == reply_id)
                    .ok_or_else(|| EngineError::not_found(reply_id))?;
                let reply = &comment.replies[position];
                if reply.author.author_id != actor_id && comment.author.author_id != actor_id {
                    return Err(EngineError::Forbidden {
                        reason: "only the reply or comment author may remove a reply".into(),
                    });
                }
                Ok(comment.replies.remove(position))
            })
            .await?;
        Ok(removed)
    }
}
