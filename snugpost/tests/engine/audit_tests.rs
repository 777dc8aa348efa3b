use crate::support::*;

async fn busy_post(engine: &SocialEngine<MemoryStore>) -> Result<(Post, Comment), EngineError> {
    let post = engine.publish(&actor("author"), "busy", None).await?;
    engine
        .toggle_reaction(&Target::Post(post.id.clone()), &actor("u1"), ReactionKind::Like)
        .await?;
    let comment = engine.add_comment(&post.id, &actor("u2"), "first").await?;
    engine.add_comment(&post.id, &actor("u3"), "second").await?;
    engine.share_to_feed(&post, &actor("u4"), None).await?;
    Ok((post, comment))
}

#[tokio::test]
async fn consistent_post_reports_no_drift() -> Result<(), EngineError> {
    let engine = engine();
    let (post, _) = busy_post(&engine).await?;
    let report = engine.audit_post(&post.id, true).await?;
    assert!(report.is_consistent(), "unexpected drift: {:?}", report.drifts);
    assert_eq!(report.repaired, 0);
    Ok(())
}

#[tokio::test]
async fn drifted_counters_are_detected_and_repaired() -> Result<(), EngineError> {
    let engine = engine();
    let (post, comment) = busy_post(&engine).await?;
    let keys = engine.content().keys();

    let mut raw_post = serde_json::to_value(engine.post(&post.id).await?).expect("serialize post");
    raw_post["likeCount"] = json!(5);
    raw_post["commentCount"] = json!(0);
    raw_post["shareCount"] = json!(3);
    engine.content().store().put_raw(&keys.post(&post.id), raw_post)?;

    let mut raw_comment = serde_json::to_value(engine.comment(&comment.id).await?).expect("serialize comment");
    raw_comment["dislikesCount"] = json!(2);
    engine.content().store().put_raw(&keys.comment(&comment.id), raw_comment)?;

    let dry_run = engine.audit_post(&post.id, false).await?;
    assert_eq!(dry_run.drifts.len(), 4);
    assert_eq!(dry_run.repaired, 0);
    assert_eq!(engine.post(&post.id).await?.like_count, 5);

    let repaired = engine.audit_post(&post.id, true).await?;
    assert_eq!(repaired.repaired, 4);
    assert!(repaired.conflicts.is_empty());

    let post = engine.post(&post.id).await?;
    assert_eq!((post.like_count, post.comment_count, post.share_count), (1, 2, 1));
    assert_post_consistent(&post);
    assert_comment_consistent(&engine.comment(&comment.id).await?);
    assert!(engine.audit_post(&post.id, true).await?.is_consistent());
    Ok(())
}

#[tokio::test]
async fn auditing_a_missing_post_fails() {
    let engine = engine();
    let err = engine.audit_post("missing", false).await.expect_err("no such post");
    assert!(matches!(err, EngineError::TargetNotFound { .. }));
}
