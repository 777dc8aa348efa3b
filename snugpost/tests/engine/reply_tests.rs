use crate::support::*;
use snugpost::runtime::commands::{MutationCommand, MutationPlan};

/// Loses every reply-array write race; everything else passes through.
#[derive(Clone)]
struct ContendedStore {
    inner: MemoryStore,
}

impl DocumentStore for ContendedStore {
    async fn fetch(&self, key: &str) -> Result<Option<Value>, EngineError> {
        self.inner.fetch(key).await
    }

    async fn fetch_many(&self, keys: &[String]) -> Result<Vec<Option<Value>>, EngineError> {
        self.inner.fetch_many(keys).await
    }

    async fn index(&self, index_key: &str) -> Result<Vec<String>, EngineError> {
        self.inner.index(index_key).await
    }

    async fn reaction(&self, reactions_key: &str, actor_id: &str) -> Result<Option<ReactionKind>, EngineError> {
        self.inner.reaction(reactions_key, actor_id).await
    }

    async fn apply(&self, plan: &MutationPlan) -> Result<Vec<Value>, EngineError> {
        let contended = plan
            .commands
            .iter()
            .any(|command| matches!(command, MutationCommand::ReplaceField(_)));
        if contended {
            return Err(EngineError::VersionConflict {
                expected: 1,
                actual: Some(2),
            });
        }
        self.inner.apply(plan).await
    }
}

async fn thread(engine: &SocialEngine<MemoryStore>) -> Result<(Post, Comment), EngineError> {
    let post = engine.publish(&actor("author"), "thread", None).await?;
    let comment = engine.add_comment(&post.id, &actor("commenter"), "top level").await?;
    Ok((post, comment))
}

#[tokio::test]
async fn second_reply_is_liked_alone() -> Result<(), EngineError> {
    let engine = engine();
    let (post, comment) = thread(&engine).await?;

    let r1 = engine.add_reply(&post.id, &comment.id, &actor("u1"), "one", None).await?;
    let r2 = engine.add_reply(&post.id, &comment.id, &actor("u2"), "two", None).await?;
    let outcome = engine
        .toggle_reply_reaction(&post.id, &comment.id, &r2.id, &actor("u3"), ReactionKind::Like)
        .await?;
    assert_eq!(outcome.likes, 1);

    let stored = engine.comment(&comment.id).await?;
    assert_eq!(stored.replies.len(), 2);
    assert_eq!(stored.replies[0].id, r1.id);
    assert_eq!(stored.replies[0].likes_count, 0);
    assert_eq!(stored.replies[1].id, r2.id);
    assert_eq!(stored.replies[1].likes_count, 1);
    assert!(has(&stored.replies[1].liked_by, "u3"));
    assert_eq!(stored.likes_count, 0, "comment counters are untouched by reply reactions");
    assert_comment_consistent(&stored);
    Ok(())
}

#[tokio::test]
async fn reply_reactions_follow_the_toggle_rule() -> Result<(), EngineError> {
    let engine = engine();
    let (post, comment) = thread(&engine).await?;
    let reply = engine.add_reply(&post.id, &comment.id, &actor("u1"), "hm", None).await?;
    let voter = actor("u2");

    engine
        .toggle_reply_reaction(&post.id, &comment.id, &reply.id, &voter, ReactionKind::Dislike)
        .await?;
    let outcome = engine
        .toggle_reply_reaction(&post.id, &comment.id, &reply.id, &voter, ReactionKind::Like)
        .await?;
    assert_eq!(outcome.previous, Some(ReactionKind::Dislike));
    assert_eq!((outcome.likes, outcome.dislikes), (1, 0));

    let cleared = engine
        .toggle_reply_reaction(&post.id, &comment.id, &reply.id, &voter, ReactionKind::Like)
        .await?;
    assert_eq!(cleared.current, None);
    assert_eq!((cleared.likes, cleared.dislikes), (0, 0));
    assert_comment_consistent(&engine.comment(&comment.id).await?);
    Ok(())
}

#[tokio::test]
async fn answering_a_reply_stays_flat_with_a_mention() -> Result<(), EngineError> {
    let engine = engine();
    let (post, comment) = thread(&engine).await?;
    let parent = engine
        .add_reply(&post.id, &comment.id, &Actor::new("u1", "Alice"), "agreed", None)
        .await?;

    let answer = engine
        .add_reply(&post.id, &comment.id, &actor("u2"), "why?", Some(&parent.id))
        .await?;
    assert_eq!(answer.content, "@Alice why?");

    let stored = engine.comment(&comment.id).await?;
    assert_eq!(stored.replies.len(), 2);
    assert_eq!(stored.replies[1].content, "@Alice why?");
    assert_eq!(stored.replies[1].comment_id, comment.id);
    Ok(())
}

#[tokio::test]
async fn answering_a_missing_reply_fails() -> Result<(), EngineError> {
    let engine = engine();
    let (post, comment) = thread(&engine).await?;
    let err = engine
        .add_reply(&post.id, &comment.id, &actor("u2"), "why?", Some("gone"))
        .await
        .expect_err("unknown parent reply");
    assert!(matches!(err, EngineError::TargetNotFound { .. }));
    assert!(engine.comment(&comment.id).await?.replies.is_empty());
    Ok(())
}

#[tokio::test]
async fn reply_on_a_comment_of_another_post_is_not_found() -> Result<(), EngineError> {
    let engine = engine();
    let (_, comment) = thread(&engine).await?;
    let other = engine.publish(&actor("author"), "other", None).await?;
    let err = engine
        .add_reply(&other.id, &comment.id, &actor("u1"), "hi", None)
        .await
        .expect_err("comment belongs to another post");
    assert!(matches!(err, EngineError::TargetNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn reply_removal_is_limited_to_authors() -> Result<(), EngineError> {
    let engine = engine();
    let (post, comment) = thread(&engine).await?;
    let first = engine.add_reply(&post.id, &comment.id, &actor("u1"), "one", None).await?;
    let second = engine.add_reply(&post.id, &comment.id, &actor("u2"), "two", None).await?;

    let err = engine
        .remove_reply(&post.id, &comment.id, &first.id, &actor("u9"))
        .await
        .expect_err("stranger cannot remove");
    assert!(matches!(err, EngineError::Forbidden { .. }));

    engine.remove_reply(&post.id, &comment.id, &first.id, &actor("u1")).await?;
    engine
        .remove_reply(&post.id, &comment.id, &second.id, &actor("commenter"))
        .await?;
    assert!(engine.comment(&comment.id).await?.replies.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reply_reactions_lose_no_updates() -> Result<(), EngineError> {
    const ACTORS: usize = 8;
    let engine = engine_with_retry(RetryPolicy::new(2 * ACTORS as u32, 1, 10));
    let (post, comment) = thread(&engine).await?;
    let reply = engine.add_reply(&post.id, &comment.id, &actor("u0"), "hot take", None).await?;

    let mut handles = Vec::new();
    for idx in 0..ACTORS {
        let engine = engine.clone();
        let (post_id, comment_id, reply_id) = (post.id.clone(), comment.id.clone(), reply.id.clone());
        handles.push(tokio::spawn(async move {
            engine
                .toggle_reply_reaction(&post_id, &comment_id, &reply_id, &actor(&format!("v{idx}")), ReactionKind::Like)
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("reply task panicked")?;
    }

    let stored = engine.comment(&comment.id).await?;
    let reply = stored.reply(&reply.id).expect("reply survives");
    assert_eq!(reply.likes_count, ACTORS as i64);
    assert_eq!(reply.liked_by.len(), ACTORS);
    assert_comment_consistent(&stored);
    Ok(())
}

#[tokio::test]
async fn persistent_contention_exhausts_the_retry_budget() -> Result<(), EngineError> {
    let engine = SocialEngine::new(
        ContendedStore {
            inner: MemoryStore::new(),
        },
        &config().with_retry(RetryPolicy::new(3, 5, 20)),
    );
    let post = engine.publish(&actor("author"), "busy", None).await?;
    let comment = engine.add_comment(&post.id, &actor("u1"), "busy too").await?;

    let err = engine
        .add_reply(&post.id, &comment.id, &actor("u2"), "lost", None)
        .await
        .expect_err("every attempt conflicts");
    assert!(matches!(err, EngineError::ConflictExhausted { attempts: 3 }));
    assert!(engine.comment(&comment.id).await?.replies.is_empty());
    Ok(())
}
