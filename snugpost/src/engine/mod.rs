//! The social engine facade.
//!
//! Wires the content store, counter layer, reaction engine, reply tree
//! updater, share resolver and auditor over one [`DocumentStore`]. Every
//! operation returns a typed [`EngineResult`]; no failure is retried here
//! except version races on reply arrays.

pub mod reactions;
pub mod replies;
pub mod shares;

pub use reactions::ReactionEngine;
pub use replies::ReplyTreeUpdater;
pub use shares::{ShareChainResolver, resolve_origin};

use crate::{
    audit::{AuditReport, CounterAuditor},
    config::EngineConfig,
    counters::Counters,
    errors::EngineResult,
    reaction::ReactionOutcome,
    repository::ContentStore,
    runtime::{DocumentStore, RedisStore},
    types::{Actor, Comment, Post, ReactionKind, Reply, Target},
};

#[derive(Clone)]
pub struct SocialEngine<S> {
    content: ContentStore<S>,
    counters: Counters<S>,
    reactions: ReactionEngine<S>,
    replies: ReplyTreeUpdater<S>,
    shares: ShareChainResolver<S>,
    auditor: CounterAuditor<S>,
}

impl SocialEngine<RedisStore> {
    pub async fn connect(url: &str, config: &EngineConfig) -> EngineResult<Self> {
        let store = RedisStore::connect(url).await?;
        Ok(Self::new(store, config))
    }
}

impl<S> SocialEngine<S>
where
    S: DocumentStore + Clone,
{
    pub fn new(store: S, config: &EngineConfig) -> Self {
        let namespace = config.namespace();
        let content = ContentStore::new(store.clone(), namespace.clone());
        let counters = Counters::new(store.clone(), namespace.clone());
        Self {
            reactions: ReactionEngine::new(store.clone(), namespace.clone()),
            replies: ReplyTreeUpdater::new(store, namespace, config.retry),
            shares: ShareChainResolver::new(content.clone(), counters.clone()),
            auditor: CounterAuditor::new(content.clone(), counters.clone()),
            content,
            counters,
        }
    }

    pub fn content(&self) -> &ContentStore<S> {
        &self.content
    }

    pub fn counters(&self) -> &Counters<S> {
        &self.counters
    }

    pub fn reactions(&self) -> &ReactionEngine<S> {
        &self.reactions
    }

    pub fn replies(&self) -> &ReplyTreeUpdater<S> {
        &self.replies
    }

    pub fn shares(&self) -> &ShareChainResolver<S> {
        &self.shares
    }

    pub fn auditor(&self) -> &CounterAuditor<S> {
        &self.auditor
    }

    pub async fn publish(&self, actor: &Actor, content: &str, image_url: Option<String>) -> EngineResult<Post> {
        self.content.create_post(actor, content, image_url).await
    }

    pub async fn post(&self, post_id: &str) -> EngineResult<Post> {
        self.content.get_post(post_id).await
    }

    pub async fn feed(&self, viewer_id: Option<&str>, limit: usize) -> EngineResult<Vec<Post>> {
        self.content.feed(viewer_id, limit).await
    }

    pub async fn hide_post(&self, post_id: &str, actor: &Actor) -> EngineResult<bool> {
        self.content.hide_post(post_id, actor).await
    }

    pub async fn add_comment(&self, post_id: &str, actor: &Actor, content: &str) -> EngineResult<Comment> {
        self.content.add_comment(post_id, actor, content).await
    }

    pub async fn comment(&self, comment_id: &str) -> EngineResult<Comment> {
        self.content.get_comment(comment_id).await
    }

    pub async fn comments(&self, post_id: &str) -> EngineResult<Vec<Comment>> {
        self.content.comments(post_id).await
    }

    pub async fn delete_comment(&self, post_id: &str, comment_id: &str, actor: &Actor) -> EngineResult<()> {
        self.content.delete_comment(post_id, comment_id, actor).await
    }

    pub async fn toggle_reaction(
        &self,
        target: &Target,
        actor: &Actor,
        kind: ReactionKind,
    ) -> EngineResult<ReactionOutcome> {
        self.reactions.toggle(target, actor, kind).await
    }

    pub async fn add_reply(
        &self,
        post_id: &str,
        comment_id: &str,
        actor: &Actor,
        content: &str,
        reply_to: Option<&str>,
    ) -> EngineResult<Reply> {
        self.replies
            .add_reply(post_id, comment_id, actor, content, reply_to)
            .await
    }

    pub async fn toggle_reply_reaction(
        &self,
        post_id: &str,
        comment_id: &str,
        reply_id: &str,
        actor: &Actor,
        kind: ReactionKind,
    ) -> EngineResult<ReactionOutcome> {
        self.replies
            .toggle_reaction(post_id, comment_id, reply_id, actor, kind)
            .await
    }

    pub async fn remove_reply(
        &self,
        post_id: &str,
        comment_id: &str,
        reply_id: &str,
        actor: &Actor,
    ) -> EngineResult<Reply> {
        self.replies.remove_reply(post_id, comment_id, reply_id, actor).await
    }

    pub async fn share_to_feed(&self, original: &Post, actor: &Actor, caption: Option<&str>) -> EngineResult<Post> {
        self.shares.share_to_feed(original, actor, caption).await
    }

    pub async fn audit_post(&self, post_id: &str, repair: bool) -> EngineResult<AuditReport> {
        self.auditor.audit_post(post_id, repair).await
    }
}
