use crate::support::*;

#[tokio::test]
async fn chain_of_shares_credits_the_root() -> Result<(), EngineError> {
    let engine = engine();
    let root = engine
        .publish(&Actor::new("a", "Ada"), "original thought", Some("https://cdn/p.png".into()))
        .await?;

    let mut current = root.clone();
    let mut shares = Vec::new();
    for sharer in ["b", "c", "d", "e"] {
        let share = engine
            .share_to_feed(&current, &actor(sharer), Some("look"))
            .await?;
        let origin = share.origin.as_ref().expect("a share carries its origin");
        assert_eq!(origin.original_post_id, root.id);
        assert_eq!(origin.original_user_id, "a");
        assert_eq!(origin.original_author_name, "Ada");
        assert_eq!(origin.original_content, "original thought");
        assert_eq!(origin.original_image_url.as_deref(), Some("https://cdn/p.png"));
        assert_eq!(share.root_id(), root.id);
        shares.push(share.clone());
        current = share;
    }

    assert_eq!(engine.post(&root.id).await?.share_count, 4);
    for share in &shares {
        assert_eq!(engine.post(&share.id).await?.share_count, 0);
    }
    let feed = engine.feed(None, 10).await?;
    assert_eq!(feed.len(), 5);
    assert_eq!(feed[0].id, shares[3].id);
    Ok(())
}

#[tokio::test]
async fn sharing_a_vanished_root_writes_nothing() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("a"), "here today", None).await?;
    let mut ghost = post.clone();
    ghost.id = "gone".into();
    let before = engine.content().store().document_count()?;

    let err = engine
        .share_to_feed(&ghost, &actor("b"), None)
        .await
        .expect_err("root no longer exists");
    assert!(matches!(err, EngineError::TargetNotFound { .. }));
    assert_eq!(engine.content().store().document_count()?, before);
    assert_eq!(engine.feed(None, 10).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn anonymous_share_is_rejected() -> Result<(), EngineError> {
    let engine = engine();
    let post = engine.publish(&actor("a"), "hello", None).await?;
    let err = engine
        .share_to_feed(&post, &actor(""), None)
        .await
        .expect_err("blank actor");
    assert!(matches!(err, EngineError::NotAuthenticated));
    assert_eq!(engine.post(&post.id).await?.share_count, 0);
    Ok(())
}
