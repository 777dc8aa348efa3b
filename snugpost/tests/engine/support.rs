pub(crate) use serde_json::{Value, json};
pub(crate) use snugpost::{
    Actor, Comment, EngineConfig, EngineError, MemoryStore, Post, ReactionKind, Reply, RetryPolicy, SocialEngine,
    Target,
    runtime::DocumentStore,
};
pub(crate) use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) static TEST_NAMESPACE_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn config() -> EngineConfig {
    let idx = TEST_NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
    EngineConfig::new(format!("snugpost_test_{idx}"))
}

pub(crate) fn engine() -> SocialEngine<MemoryStore> {
    SocialEngine::new(MemoryStore::new(), &config())
}

pub(crate) fn engine_with_retry(retry: RetryPolicy) -> SocialEngine<MemoryStore> {
    SocialEngine::new(MemoryStore::new(), &config().with_retry(retry))
}

pub(crate) fn actor(id: &str) -> Actor {
    Actor::new(id, format!("User {id}"))
}

pub(crate) fn has(set: &[String], actor_id: &str) -> bool {
    set.iter().any(|id| id == actor_id)
}

fn assert_tallies(label: &str, likes: i64, liked_by: &[String], dislikes: i64, disliked_by: &[String]) {
    assert_eq!(likes, liked_by.len() as i64, "{label}: like count must equal likedBy size");
    assert_eq!(dislikes, disliked_by.len() as i64, "{label}: dislike count must equal dislikedBy size");
    for actor_id in liked_by {
        assert!(!has(disliked_by, actor_id), "{label}: {actor_id} holds both reactions");
    }
    let mut unique = liked_by.to_vec();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), liked_by.len(), "{label}: likedBy must not repeat actors");
}

pub(crate) fn assert_post_consistent(post: &Post) {
    assert_tallies(&post.id, post.like_count, &post.liked_by, post.dislike_count, &post.disliked_by);
}

pub(crate) fn assert_comment_consistent(comment: &Comment) {
    assert_tallies(
        &comment.id,
        comment.likes_count,
        &comment.liked_by,
        comment.dislikes_count,
        &comment.disliked_by,
    );
    for reply in &comment.replies {
        assert_reply_consistent(reply);
    }
}

pub(crate) fn assert_reply_consistent(reply: &Reply) {
    assert_tallies(&reply.id, reply.likes_count, &reply.liked_by, reply.dislikes_count, &reply.disliked_by);
}
