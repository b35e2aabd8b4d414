//! Typed requests and responses exchanged with the engine.
//!
//! Both enums are internally tagged (`{"type": "create_user", ...}`) so an
//! adapter can frame them as JSON without extra wrapping.

use chrono::{DateTime, Utc};
use rr_core::models::{DirectMessage, Post};
use rr_core::traits::RequestKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Liveness probe; never touches the store.
    Ping,
    CreateUser {
        id: String,
        username: String,
        password: String,
    },
    CreateSubreddit {
        id: String,
        name: String,
        description: String,
        creator_id: String,
    },
    JoinSubreddit {
        subreddit_id: String,
        user_id: String,
    },
    LeaveSubreddit {
        subreddit_id: String,
        user_id: String,
    },
    CreatePost {
        id: String,
        subreddit_id: String,
        author_id: String,
        title: String,
        content: String,
    },
    CreateComment {
        id: String,
        post_id: String,
        #[serde(default)]
        parent_id: Option<String>,
        author_id: String,
        content: String,
    },
    Vote {
        target_id: String,
        user_id: String,
        is_upvote: bool,
    },
    SendDirectMessage {
        id: String,
        from_id: String,
        to_id: String,
        content: String,
        #[serde(default)]
        reply_to_id: Option<String>,
    },
    GetFeed {
        subreddit_ids: Vec<String>,
        #[serde(default)]
        limit: Option<usize>,
    },
    GetComments {
        post_id: String,
    },
    GetDirectMessages {
        user_id: String,
    },
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Ping => RequestKind::Ping,
            Self::CreateUser { .. } => RequestKind::CreateUser,
            Self::CreateSubreddit { .. } => RequestKind::CreateSubreddit,
            Self::JoinSubreddit { .. } => RequestKind::JoinSubreddit,
            Self::LeaveSubreddit { .. } => RequestKind::LeaveSubreddit,
            Self::CreatePost { .. } => RequestKind::CreatePost,
            Self::CreateComment { .. } => RequestKind::CreateComment,
            Self::Vote { .. } => RequestKind::Vote,
            Self::SendDirectMessage { .. } => RequestKind::SendDirectMessage,
            Self::GetFeed { .. } => RequestKind::GetFeed,
            Self::GetComments { .. } => RequestKind::GetComments,
            Self::GetDirectMessages { .. } => RequestKind::GetDirectMessages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    Success { message: String },
    Error { message: String },
    Feed { posts: Vec<PostView> },
    Comments { comments: Vec<CommentView> },
    DirectMessages { messages: Vec<DirectMessage> },
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A post as it appears in a feed. The vote set stays inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub subreddit_id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub karma: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            subreddit_id: post.subreddit_id,
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            karma: post.karma,
            created_at: post.created_at,
        }
    }
}

/// A root comment plus the ids of its direct replies, derived per query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub children: Vec<String>,
}
