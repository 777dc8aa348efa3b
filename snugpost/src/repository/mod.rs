use chrono::Utc;
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::Namespace,
    counters::{CounterField, Counters},
    errors::{EngineError, EngineResult},
    id::generate_entity_id,
    keys::KeyContext,
    runtime::{
        DocumentStore,
        commands::{
            DocumentDelete, IndexAppend, IndexRemove, MutationCommand, MutationPlan, SetAdd, build_document_insert,
        },
    },
    types::{Actor, Comment, Post},
};

/// Persists posts, the feed index, and each post's ordered comments.
#[derive(Clone)]
pub struct ContentStore<S> {
    store: S,
    namespace: Namespace,
    counters: Counters<S>,
}

pub(crate) fn decode<T>(value: Value) -> EngineResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(value).map_err(|err| EngineError::serialization("deserialize stored record", err))
}

impl<S> ContentStore<S>
where
    S: DocumentStore + Clone,
{
    pub fn new(store: S, namespace: Namespace) -> Self {
        let counters = Counters::new(store.clone(), namespace.clone());
        Self {
            store,
            namespace,
            counters,
        }
    }

    pub fn keys(&self) -> KeyContext<'_> {
        self.namespace.keys()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stages a post insert plus its feed-index append.
    pub fn stage_post_insert(&self, plan: &mut MutationPlan, post: &Post) -> EngineResult<()> {
        let keys = self.keys();
        plan.push(MutationCommand::InsertDocument(build_document_insert(
            keys.post(&post.id),
            &post.id,
            post,
        )?));
        plan.push(MutationCommand::AppendIndex(IndexAppend {
            index_key: keys.feed_index(),
            member: post.id.clone(),
        }));
        Ok(())
    }

    pub async fn create_post(&self, actor: &Actor, content: &str, image_url: Option<String>) -> EngineResult<Post> {
        actor.require_id()?;
        let content = content.trim();
        if content.is_empty() && image_url.is_none() {
            return Err(EngineError::invalid("post needs content or an image"));
        }

        let post = Post {
            id: generate_entity_id(),
            author: actor.snapshot(),
            content: content.to_string(),
            created_at: Utc::now(),
            like_count: 0,
            dislike_count: 0,
            comment_count: 0,
            share_count: 0,
            image_url,
            hidden_by: Vec::new(),
            liked_by: Vec::new(),
            disliked_by: Vec::new(),
            origin: None,
            version: 1,
        };

        let mut plan = MutationPlan::new();
        self.stage_post_insert(&mut plan, &post)?;
        self.store.apply(&plan).await?;
        debug!("published post {}", post.id);
        Ok(post)
    }

    pub async fn find_post(&self, post_id: &str) -> EngineResult<Option<Post>> {
        self.store
            .fetch(&self.keys().post(post_id))
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn get_post(&self, post_id: &str) -> EngineResult<Post> {
        self.find_post(post_id)
            .await?
            .ok_or_else(|| EngineError::not_found(post_id))
    }

    /// Every post in publish order, oldest first.
    pub async fn all_posts(&self) -> EngineResult<Vec<Post>> {
        let keys = self.keys();
        let ids = self.store.index(&keys.feed_index()).await?;
        let post_keys: Vec<String> = ids.iter().map(|id| keys.post(id)).collect();
        self.store
            .fetch_many(&post_keys)
            .await?
            .into_iter()
            .flatten()
            .map(decode)
            .collect()
    }

    /// Newest posts first, skipping posts the viewer has hidden.
    pub async fn feed(&self, viewer_id: Option<&str>, limit: usize) -> EngineResult<Vec<Post>> {
        let mut posts = self.all_posts().await?;
        posts.reverse();
        Ok(posts
            .into_iter()
            .filter(|post| viewer_id.is_none_or(|viewer| !post.is_hidden_for(viewer)))
            .take(limit)
            .collect())
    }

    /// Hides a post from the actor's feed. Returns false if it was already hidden.
    pub async fn hide_post(&self, post_id: &str, actor: &Actor) -> EngineResult<bool> {
        let actor_id = actor.require_id()?;
        let mut plan = MutationPlan::new();
        plan.push(MutationCommand::AddToSet(SetAdd {
            key: self.keys().post(post_id),
            entity_id: post_id.to_string(),
            field: "hiddenBy".to_string(),
            member: actor_id.to_string(),
        }));
        let responses = self.store.apply(&plan).await?;
        Ok(responses
            .first()
            .and_then(|response| response.get("added"))
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    /// Creates a comment and bumps the post's comment count in one plan.
    pub async fn add_comment(&self, post_id: &str, actor: &Actor, content: &str) -> EngineResult<Comment> {
        actor.require_id()?;
        let content = content.trim();
        if content.is_empty() {
            return Err(EngineError::invalid("comment content must not be empty"));
        }

        let comment = Comment {
            id: generate_entity_id(),
            post_id: post_id.to_string(),
            author: actor.snapshot(),
            content: content.to_string(),
            created_at: Utc::now(),
            likes_count: 0,
            liked_by: Vec::new(),
            dislikes_count: 0,
            disliked_by: Vec::new(),
            replies: Vec::new(),
            version: 1,
        };

        let keys = self.keys();
        let mut plan = MutationPlan::new();
        plan.push(MutationCommand::InsertDocument(build_document_insert(
            keys.comment(&comment.id),
            &comment.id,
            &comment,
        )?));
        plan.push(MutationCommand::AppendIndex(IndexAppend {
            index_key: keys.comment_index(post_id),
            member: comment.id.clone(),
        }));
        self.counters.stage(&mut plan, post_id, CounterField::PostComments, 1);
        self.store.apply(&plan).await?;
        debug!("comment {} added to post {post_id}", comment.id);
        Ok(comment)
    }

    pub async fn find_comment(&self, comment_id: &str) -> EngineResult<Option<Comment>> {
        self.store
            .fetch(&self.keys().comment(comment_id))
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn get_comment(&self, comment_id: &str) -> EngineResult<Comment> {
        self.find_comment(comment_id)
            .await?
            .ok_or_else(|| EngineError::not_found(comment_id))
    }

    /// Comments under a post in submission order.
    pub async fn comments(&self, post_id: &str) -> EngineResult<Vec<Comment>> {
        let keys = self.keys();
        let ids = self.store.index(&keys.comment_index(post_id)).await?;
        let comment_keys: Vec<String> = ids.iter().map(|id| keys.comment(id)).collect();
        self.store
            .fetch_many(&comment_keys)
            .await?
            .into_iter()
            .flatten()
            .map(decode)
            .collect()
    }

    /// Removes a comment and decrements the post's comment count in one plan.
    ///
    /// Only the comment's author may delete it.
    pub async fn delete_comment(&self, post_id: &str, comment_id: &str, actor: &Actor) -> EngineResult<()> {
        let actor_id = actor.require_id()?;
        let comment = self.get_comment(comment_id).await?;
        if comment.post_id != post_id {
            return Err(EngineError::not_found(comment_id));
        }
        if comment.author.author_id != actor_id {
            return Err(EngineError::Forbidden {
                reason: "only the author may delete a comment".into(),
            });
        }

        let keys = self.keys();
        let mut plan = MutationPlan::new();
        plan.push(MutationCommand::DeleteDocument(DocumentDelete {
            key: keys.comment(comment_id),
            entity_id: comment_id.to_string(),
            reactions_key: Some(keys.reactions(comment_id)),
        }));
        plan.push(MutationCommand::RemoveIndex(IndexRemove {
            index_key: keys.comment_index(post_id),
            member: comment_id.to_string(),
        }));
        self.counters.stage(&mut plan, post_id, CounterField::PostComments, -1);
        self.store.apply(&plan).await?;
        debug!("comment {comment_id} removed from post {post_id}");
        Ok(())
    }
}
