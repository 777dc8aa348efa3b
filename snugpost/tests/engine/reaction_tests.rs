use crate::support::*;

#[tokio::test]
async fn liking_twice_restores_the_post() -> Result<(), EngineError> {
    let engine = engine();
    let author = actor("author");
    let fan = actor("u1");
    let post = engine.publish(&author, "hello", None).await?;
    let target = Target::Post(post.id.clone());

    let first = engine.toggle_reaction(&target, &fan, ReactionKind::Like).await?;
    assert_eq!(first.previous, None);
    assert_eq!(first.current, Some(ReactionKind::Like));
    assert_eq!((first.likes, first.dislikes), (1, 0));
    let liked = engine.post(&post.id).await?;
    assert_eq!(liked.like_count, 1);
    assert!(has(&liked.liked_by, "u1"));
    assert_post_consistent(&liked);

    let second = engine.toggle_reaction(&target, &fan, ReactionKind::Like).await?;
    assert_eq!(second.current, None);
    let restored = engine.post(&post.id).await?;
    assert_eq!(restored.like_count, 0);
    assert!(restored.liked_by.is_empty());
    assert_post_consistent(&restored);
    Ok(())
}

#[tokio::test]
async fn dislike_then_like_moves_the_actor_across() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "topic", None).await?;
    let comment = engine.add_comment(&post.id, &actor("author"), "first!").await?;
    let target = Target::Comment(comment.id.clone());
    let critic = actor("u2");

    engine.toggle_reaction(&target, &critic, ReactionKind::Dislike).await?;
    let disliked = engine.comment(&comment.id).await?;
    assert_eq!((disliked.likes_count, disliked.dislikes_count), (0, 1));

    let outcome = engine.toggle_reaction(&target, &critic, ReactionKind::Like).await?;
    assert_eq!(outcome.previous, Some(ReactionKind::Dislike));
    assert_eq!(outcome.current, Some(ReactionKind::Like));
    let liked = engine.comment(&comment.id).await?;
    assert_eq!((liked.likes_count, liked.dislikes_count), (1, 0));
    assert!(has(&liked.liked_by, "u2"));
    assert!(!has(&liked.disliked_by, "u2"));
    assert_comment_consistent(&liked);
    assert_eq!(
        engine.reactions().reaction_of(&target, "u2").await?,
        Some(ReactionKind::Like)
    );
    Ok(())
}

#[tokio::test]
async fn reactions_from_many_actors_keep_counts_equal_to_sets() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "poll", None).await?;
    let target = Target::Post(post.id.clone());

    for idx in 0..6 {
        let kind = if idx % 2 == 0 { ReactionKind::Like } else { ReactionKind::Dislike };
        engine.toggle_reaction(&target, &actor(&format!("u{idx}")), kind).await?;
    }
    engine.toggle_reaction(&target, &actor("u0"), ReactionKind::Dislike).await?;
    engine.toggle_reaction(&target, &actor("u1"), ReactionKind::Dislike).await?;

    let post = engine.post(&post.id).await?;
    assert_eq!(post.like_count, 2);
    assert_eq!(post.dislike_count, 3);
    assert!(has(&post.disliked_by, "u0"));
    assert!(!has(&post.disliked_by, "u1"));
    assert_post_consistent(&post);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_post_reactions_are_all_counted() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "viral", None).await?;

    let mut handles = Vec::new();
    for idx in 0..16 {
        let engine = engine.clone();
        let target = Target::Post(post.id.clone());
        handles.push(tokio::spawn(async move {
            engine
                .toggle_reaction(&target, &actor(&format!("u{idx}")), ReactionKind::Like)
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("reaction task panicked")?;
    }

    let post = engine.post(&post.id).await?;
    assert_eq!(post.like_count, 16);
    assert_post_consistent(&post);
    Ok(())
}

#[tokio::test]
async fn anonymous_reaction_is_rejected_without_writes() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "hello", None).await?;

    let err = engine
        .toggle_reaction(&Target::Post(post.id.clone()), &actor(""), ReactionKind::Like)
        .await
        .expect_err("blank actor must be rejected");
    assert!(matches!(err, EngineError::NotAuthenticated));
    assert_eq!(engine.post(&post.id).await?.like_count, 0);
    Ok(())
}

#[tokio::test]
async fn reacting_to_a_missing_target_fails() {
    let engine = engine();
    let err = engine
        .toggle_reaction(&Target::Post("missing".into()), &actor("u1"), ReactionKind::Like)
        .await
        .expect_err("missing post must be reported");
    assert!(matches!(err, EngineError::TargetNotFound { .. }));
}

#[tokio::test]
async fn legacy_set_membership_is_honored_without_a_slot() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "old", None).await?;
    let key = engine.content().keys().post(&post.id);
    let mut raw = serde_json::to_value(&post).expect("serialize post");
    raw["likeCount"] = json!(1);
    raw["likedBy"] = json!(["u7"]);
    engine.content().store().put_raw(&key, raw)?;

    let outcome = engine
        .toggle_reaction(&Target::Post(post.id.clone()), &actor("u7"), ReactionKind::Like)
        .await?;
    assert_eq!(outcome.previous, Some(ReactionKind::Like));
    assert_eq!(outcome.current, None);
    let post = engine.post(&post.id).await?;
    assert_eq!(post.like_count, 0);
    assert_post_consistent(&post);
    Ok(())
}
