use chrono::Utc;
use log::debug;

use crate::{
    counters::{CounterField, Counters},
    errors::EngineResult,
    id::generate_entity_id,
    repository::ContentStore,
    runtime::{DocumentStore, commands::MutationPlan},
    types::{Actor, Origin, Post},
};

/// Resolves share chains to their root and records shares.
#[derive(Clone)]
pub struct ShareChainResolver<S> {
    content: ContentStore<S>,
    counters: Counters<S>,
}

/// Origin fields for a share of `original`: its own origin if it is already
/// a share, otherwise `original` itself. Chain depth is therefore always one.
pub fn resolve_origin(original: &Post) -> Origin {
    match &original.origin {
        Some(origin) => origin.clone(),
        None => Origin {
            original_post_id: original.id.clone(),
            original_user_id: original.author.author_id.clone(),
            original_author_name: original.author.author_name.clone(),
            original_author_avatar_url: original.author.author_avatar_url.clone(),
            original_content: original.content.clone(),
            original_image_url: original.image_url.clone(),
        },
    }
}

impl<S> ShareChainResolver<S>
where
    S: DocumentStore + Clone,
{
    pub fn new(content: ContentStore<S>, counters: Counters<S>) -> Self {
        Self { content, counters }
    }

    /// Publishes a share of `original` and bumps the root's share count.
    ///
    /// The share-post insert, its feed entry and the root counter bump are one
    /// plan: if the root no longer exists the whole share fails with
    /// `TargetNotFound` and nothing is written.
    pub async fn share_to_feed(&self, original: &Post, actor: &Actor, caption: Option<&str>) -> EngineResult<Post> {
        actor.require_id()?;
        let origin = resolve_origin(original);
        let root_id = origin.original_post_id.clone();

        let share = Post {
            id: generate_entity_id(),
            author: actor.snapshot(),
            content: caption.map(str::trim).unwrap_or_default().to_string(),
            created_at: Utc::now(),
            like_count: 0,
            dislike_count: 0,
            comment_count: 0,
            share_count: 0,
            image_url: None,
            hidden_by: Vec::new(),
            liked_by: Vec::new(),
            disliked_by: Vec::new(),
            origin: Some(origin),
            version: 1,
        };

        let mut plan = MutationPlan::new();
        self.content.stage_post_insert(&mut plan, &share)?;
        self.counters.stage(&mut plan, &root_id, CounterField::PostShares, 1);
        self.content.store().apply(&plan).await?;
        debug!("post {} shares root {root_id} (via {})", share.id, original.id);
        Ok(share)
    }
}
