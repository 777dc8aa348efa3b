//! The like/dislike transition rule.
//!
//! Every target holds at most one reaction per actor. A toggle is resolved
//! from that single slot, and the counter deltas fall out of the transition,
//! so a store only ever applies `(slot, like_delta, dislike_delta)` together.

use serde::{Deserialize, Serialize};

use crate::types::{Comment, Post, ReactionKind, Reply};

/// Result of toggling `requested` on a slot that held `previous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTransition {
    pub previous: Option<ReactionKind>,
    pub current: Option<ReactionKind>,
}

impl ReactionTransition {
    /// Toggling the held kind clears the slot; anything else replaces it.
    pub fn resolve(previous: Option<ReactionKind>, requested: ReactionKind) -> Self {
        let current = if previous == Some(requested) {
            None
        } else {
            Some(requested)
        };
        Self { previous, current }
    }

    pub fn delta(&self, kind: ReactionKind) -> i64 {
        i64::from(self.current == Some(kind)) - i64::from(self.previous == Some(kind))
    }

    pub fn like_delta(&self) -> i64 {
        self.delta(ReactionKind::Like)
    }

    pub fn dislike_delta(&self) -> i64 {
        self.delta(ReactionKind::Dislike)
    }
}

/// What a caller gets back from a reaction toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionOutcome {
    pub previous: Option<ReactionKind>,
    pub current: Option<ReactionKind>,
    pub likes: i64,
    pub dislikes: i64,
}

/// A record holding a like set and a dislike set with their counters.
pub trait Reactable {
    fn tallies(&self) -> (&[String], &[String]);

    fn tallies_mut(&mut self) -> (&mut i64, &mut Vec<String>, &mut i64, &mut Vec<String>);

    fn reaction_of(&self, actor_id: &str) -> Option<ReactionKind> {
        let (liked_by, disliked_by) = self.tallies();
        if liked_by.iter().any(|id| id == actor_id) {
            Some(ReactionKind::Like)
        } else if disliked_by.iter().any(|id| id == actor_id) {
            Some(ReactionKind::Dislike)
        } else {
            None
        }
    }

    /// Applies the toggle rule for one actor to this record in place.
    fn toggle(&mut self, actor_id: &str, requested: ReactionKind) -> ReactionTransition {
        let transition = ReactionTransition::resolve(self.reaction_of(actor_id), requested);
        let (likes, liked_by, dislikes, disliked_by) = self.tallies_mut();
        apply_delta(likes, liked_by, actor_id, transition.like_delta());
        apply_delta(dislikes, disliked_by, actor_id, transition.dislike_delta());
        transition
    }

    fn outcome(&self, transition: ReactionTransition) -> ReactionOutcome {
        let (liked_by, disliked_by) = self.tallies();
        ReactionOutcome {
            previous: transition.previous,
            current: transition.current,
            likes: liked_by.len() as i64,
            dislikes: disliked_by.len() as i64,
        }
    }
}

// Counters only move when set membership actually changes.
fn apply_delta(count: &mut i64, members: &mut Vec<String>, actor_id: &str, delta: i64) {
    match delta {
        1 => {
            if !members.iter().any(|id| id == actor_id) {
                members.push(actor_id.to_string());
                *count += 1;
            }
        }
        -1 => {
            let before = members.len();
            members.retain(|id| id != actor_id);
            *count -= (before - members.len()) as i64;
        }
        _ => {}
    }
}

impl Reactable for Reply {
    fn tallies(&self) -> (&[String], &[String]) {
        (&self.liked_by, &self.disliked_by)
    }

    fn tallies_mut(&mut self) -> (&mut i64, &mut Vec<String>, &mut i64, &mut Vec<String>) {
        (&mut self.likes_count, &mut self.liked_by, &mut self.dislikes_count, &mut self.disliked_by)
    }
}

impl Reactable for Comment {
    fn tallies(&self) -> (&[String], &[String]) {
        (&self.liked_by, &self.disliked_by)
    }

    fn tallies_mut(&mut self) -> (&mut i64, &mut Vec<String>, &mut i64, &mut Vec<String>) {
        (&mut self.likes_count, &mut self.liked_by, &mut self.dislikes_count, &mut self.disliked_by)
    }
}

impl Reactable for Post {
    fn tallies(&self) -> (&[String], &[String]) {
        (&self.liked_by, &self.disliked_by)
    }

    fn tallies_mut(&mut self) -> (&mut i64, &mut Vec<String>, &mut i64, &mut Vec<String>) {
        (&mut self.like_count, &mut self.liked_by, &mut self.dislike_count, &mut self.disliked_by)
    }
}
