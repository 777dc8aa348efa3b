//! Recomputes counters from the records they summarize and repairs drift.
//!
//! Repairs go through the counter layer as a delta of exactly
//! `expected - stored`, guarded by the version the audit read. A record that
//! moved in between is left alone and reported as a conflict; running the
//! audit again converges.

use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::{
    counters::{CounterField, Counters},
    errors::{EngineError, EngineResult},
    repository::ContentStore,
    runtime::{DocumentStore, commands::MutationPlan},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterDrift {
    pub target_id: String,
    pub field: &'static str,
    pub stored: i64,
    pub expected: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub post_id: String,
    pub drifts: Vec<CounterDrift>,
    pub repaired: usize,
    pub conflicts: Vec<String>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.drifts.is_empty()
    }
}

struct Pending {
    version: u64,
    fixes: Vec<(CounterField, i64)>,
}

#[derive(Clone)]
pub struct CounterAuditor<S> {
    content: ContentStore<S>,
    counters: Counters<S>,
}

impl<S> CounterAuditor<S>
where
    S: DocumentStore + Clone,
{
    pub fn new(content: ContentStore<S>, counters: Counters<S>) -> Self {
        Self { content, counters }
    }

    pub async fn audit_post(&self, post_id: &str, repair: bool) -> EngineResult<AuditReport> {
        let post = self.content.get_post(post_id).await?;
        let comments = self.content.comments(post_id).await?;
        let shares = self
            .content
            .all_posts()
            .await?
            .iter()
            .filter(|candidate| candidate.origin.as_ref().is_some_and(|origin| origin.original_post_id == post_id))
            .count() as i64;

        let mut report = AuditReport {
            post_id: post_id.to_string(),
            ..AuditReport::default()
        };
        let mut pending: BTreeMap<String, Pending> = BTreeMap::new();

        let mut check = |target_id: &str, version: u64, field: CounterField, stored: i64, expected: i64| {
            if stored == expected {
                return;
            }
            report.drifts.push(CounterDrift {
                target_id: target_id.to_string(),
                field: field.field_name(),
                stored,
                expected,
            });
            pending
                .entry(target_id.to_string())
                .or_insert_with(|| Pending {
                    version,
                    fixes: Vec::new(),
                })
                .fixes
                .push((field, expected - stored));
        };

        check(&post.id, post.version, CounterField::PostLikes, post.like_count, post.liked_by.len() as i64);
        check(
            &post.id,
            post.version,
            CounterField::PostDislikes,
            post.dislike_count,
            post.disliked_by.len() as i64,
        );
        check(&post.id, post.version, CounterField::PostComments, post.comment_count, comments.len() as i64);
        check(&post.id, post.version, CounterField::PostShares, post.share_count, shares);
        for comment in &comments {
            check(
                &comment.id,
                comment.version,
                CounterField::CommentLikes,
                comment.likes_count,
                comment.liked_by.len() as i64,
            );
            check(
                &comment.id,
                comment.version,
                CounterField::CommentDislikes,
                comment.dislikes_count,
                comment.disliked_by.len() as i64,
            );
        }

        for drift in &report.drifts {
            warn!(
                "counter drift on {} {}: stored {} expected {}",
                drift.target_id, drift.field, drift.stored, drift.expected
            );
        }

        if repair {
            for (target_id, fix) in pending {
                // one guard per target: the plan is atomic, so it covers every fix in it
                let mut plan = MutationPlan::new();
                for (index, (field, delta)) in fix.fixes.iter().enumerate() {
                    if index == 0 {
                        self.counters.stage_guarded(&mut plan, &target_id, *field, *delta, fix.version);
                    } else {
                        self.counters.stage(&mut plan, &target_id, *field, *delta);
                    }
                }
                match self.content.store().apply(&plan).await {
                    Ok(_) => report.repaired += fix.fixes.len(),
                    Err(EngineError::VersionConflict { .. }) => report.conflicts.push(target_id),
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(report)
    }
}
