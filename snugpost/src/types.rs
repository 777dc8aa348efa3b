use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{EngineError, EngineResult},
    keys::{COMMENTS, POSTS},
};

/// The actor on whose behalf a mutating call runs, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Returns the actor id, or `NotAuthenticated` when none was supplied.
    pub fn require_id(&self) -> EngineResult<&str> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(EngineError::NotAuthenticated);
        }
        Ok(id)
    }

    /// Author fields copied onto a record at write time.
    pub fn snapshot(&self) -> AuthorSnapshot {
        AuthorSnapshot {
            author_id: self.id.trim().to_string(),
            author_name: self.display_name.clone(),
            author_avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Denormalized author fields.
///
/// This is a cached snapshot: it is written once with the record and never
/// refreshed when the author later changes their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSnapshot {
    pub author_id: String,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,
}

/// Origin fields carried by a post that is itself a share.
///
/// `original_post_id` always names the root of the share chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub original_post_id: String,
    pub original_user_id: String,
    pub original_author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_author_avatar_url: Option<String>,
    pub original_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(flatten)]
    pub author: AuthorSnapshot,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub dislike_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub share_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub hidden_by: Vec<String>,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub disliked_by: Vec<String>,
    #[serde(flatten)]
    pub origin: Option<Origin>,
    #[serde(default)]
    pub version: u64,
}

impl Post {
    pub fn is_share(&self) -> bool {
        self.origin.is_some()
    }

    /// Id of the post at the origin of this post's share chain.
    pub fn root_id(&self) -> &str {
        self.origin
            .as_ref()
            .map(|origin| origin.original_post_id.as_str())
            .unwrap_or(&self.id)
    }

    pub fn is_hidden_for(&self, actor_id: &str) -> bool {
        self.hidden_by.iter().any(|id| id == actor_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    #[serde(flatten)]
    pub author: AuthorSnapshot,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub dislikes_count: i64,
    #[serde(default)]
    pub disliked_by: Vec<String>,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default)]
    pub version: u64,
}

impl Comment {
    pub fn reply(&self, reply_id: &str) -> Option<&Reply> {
        self.replies.iter().find(|reply| reply.id == reply_id)
    }
}

/// A reply embedded in its parent comment's `replies` array.
///
/// Replies never carry their own reply list: a reply to a reply is appended
/// to the same array with an `@name` prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub post_id: String,
    pub comment_id: String,
    #[serde(flatten)]
    pub author: AuthorSnapshot,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub dislikes_count: i64,
    #[serde(default)]
    pub disliked_by: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn opposite(self) -> Self {
        match self {
            Self::Like => Self::Dislike,
            Self::Dislike => Self::Like,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

/// Names of the counter and set fields a target kind stores its reactions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactionFields {
    pub like_count: &'static str,
    pub liked_by: &'static str,
    pub dislike_count: &'static str,
    pub disliked_by: &'static str,
}

impl ReactionFields {
    pub const POST: Self = Self {
        like_count: "likeCount",
        liked_by: "likedBy",
        dislike_count: "dislikeCount",
        disliked_by: "dislikedBy",
    };

    pub const COMMENT: Self = Self {
        like_count: "likesCount",
        liked_by: "likedBy",
        dislike_count: "dislikesCount",
        disliked_by: "dislikedBy",
    };
}

/// A top-level record that can receive reactions directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Post(String),
    Comment(String),
}

impl Target {
    pub fn id(&self) -> &str {
        match self {
            Self::Post(id) | Self::Comment(id) => id,
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            Self::Post(_) => POSTS,
            Self::Comment(_) => COMMENTS,
        }
    }

    pub fn reaction_fields(&self) -> ReactionFields {
        match self {
            Self::Post(_) => ReactionFields::POST,
            Self::Comment(_) => ReactionFields::COMMENT,
        }
    }
}
