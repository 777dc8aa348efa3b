use crate::support::*;

#[tokio::test]
async fn comment_count_follows_adds_and_deletes() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "discuss", None).await?;
    let first = engine.add_comment(&post.id, &actor("u1"), "one").await?;
    let second = engine.add_comment(&post.id, &actor("u2"), "two").await?;
    assert_eq!(engine.post(&post.id).await?.comment_count, 2);

    let listed: Vec<String> = engine.comments(&post.id).await?.into_iter().map(|c| c.id).collect();
    assert_eq!(listed, vec![first.id.clone(), second.id.clone()]);

    engine.delete_comment(&post.id, &first.id, &actor("u1")).await?;
    assert_eq!(engine.post(&post.id).await?.comment_count, 1);
    let remaining = engine.comments(&post.id).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);
    Ok(())
}

#[tokio::test]
async fn only_the_author_deletes_a_comment() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "discuss", None).await?;
    let comment = engine.add_comment(&post.id, &actor("u1"), "mine").await?;

    let err = engine
        .delete_comment(&post.id, &comment.id, &actor("author"))
        .await
        .expect_err("post author is not the comment author");
    assert!(matches!(err, EngineError::Forbidden { .. }));
    assert_eq!(engine.post(&post.id).await?.comment_count, 1);
    Ok(())
}

#[tokio::test]
async fn commenting_on_a_missing_post_writes_nothing() -> Result<(), EngineError> {
    let engine = engine();
    let err = engine
        .add_comment("nope", &actor("u1"), "hello?")
        .await
        .expect_err("post does not exist");
    assert!(matches!(err, EngineError::TargetNotFound { .. }));
    assert_eq!(engine.content().store().document_count()?, 0);
    assert!(engine.comments("nope").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn anonymous_comment_is_rejected() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "discuss", None).await?;
    let err = engine
        .add_comment(&post.id, &actor(" "), "who am I")
        .await
        .expect_err("blank actor");
    assert!(matches!(err, EngineError::NotAuthenticated));
    assert_eq!(engine.post(&post.id).await?.comment_count, 0);
    Ok(())
}

#[tokio::test]
async fn author_snapshot_is_not_refreshed() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("author"), "discuss", None).await?;
    let before = Actor::new("u1", "Old Name").with_avatar("https://cdn/old.png");
    let comment = engine.add_comment(&post.id, &before, "hi").await?;

    let renamed = Actor::new("u1", "New Name");
    engine.add_comment(&post.id, &renamed, "me again").await?;

    let stored = engine.comment(&comment.id).await?;
    assert_eq!(stored.author.author_name, "Old Name");
    assert_eq!(stored.author.author_avatar_url.as_deref(), Some("https://cdn/old.png"));
    Ok(())
}

#[tokio::test]
async fn feed_is_newest_first_and_respects_hiding() -> Result<(), EngineError> {
    let engine = engine();
    let author = actor("author");
    let older = engine.publish(&author, "older", None).await?;
    let newer = engine.publish(&author, "newer", None).await?;

    let ids: Vec<String> = engine.feed(None, 10).await?.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![newer.id.clone(), older.id.clone()]);

    assert!(engine.hide_post(&newer.id, &actor("u1")).await?);
    assert!(!engine.hide_post(&newer.id, &actor("u1")).await?);
    let hidden: Vec<String> = engine.feed(Some("u1"), 10).await?.into_iter().map(|p| p.id).collect();
    assert_eq!(hidden, vec![older.id.clone()]);
    assert_eq!(engine.feed(Some("u2"), 10).await?.len(), 2);
    assert_eq!(engine.feed(None, 1).await?.len(), 1);
    Ok(())
}
