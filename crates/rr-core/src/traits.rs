//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the engine.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Comment, DirectMessage, Post, Subreddit, User};

/// Data persistence contract for every entity the engine manages.
///
/// Each call is atomic with respect to concurrent callers. Implementations
/// must not hold a lock across calls to one another.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    // User Operations
    async fn create_user(&self, user: User) -> Result<()>;
    async fn get_user(&self, id: &str) -> Result<User>;

    // Subreddit Operations
    async fn create_subreddit(&self, subreddit: Subreddit) -> Result<()>;
    async fn get_subreddit(&self, id: &str) -> Result<Subreddit>;
    /// Adds the member and returns the resulting member count.
    async fn join_subreddit(&self, subreddit_id: &str, user_id: &str) -> Result<usize>;
    /// Removes the member and returns the resulting member count.
    async fn leave_subreddit(&self, subreddit_id: &str, user_id: &str) -> Result<usize>;

    // Post Operations
    async fn create_post(&self, post: Post) -> Result<()>;
    async fn get_post(&self, id: &str) -> Result<Post>;
    /// All posts of a subreddit, in no particular order.
    async fn get_subreddit_posts(&self, subreddit_id: &str) -> Result<Vec<Post>>;

    // Comment Operations
    async fn add_comment(&self, comment: Comment) -> Result<()>;
    /// All comments of a post, in no particular order.
    async fn get_comments(&self, post_id: &str) -> Result<Vec<Comment>>;

    // Message Operations
    async fn send_message(&self, message: DirectMessage) -> Result<()>;
    /// The recipient's inbox in delivery order. Empty when nothing was sent.
    async fn get_messages(&self, user_id: &str) -> Result<Vec<DirectMessage>>;

    // Vote Operations
    /// Upserts the vote. Returns the post karma afterwards when `target_id`
    /// names a post, `None` for any other target.
    async fn vote(&self, target_id: &str, user_id: &str, is_upvote: bool) -> Result<Option<i64>>;
}

/// The request kinds the engine understands, used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Ping,
    CreateUser,
    CreateSubreddit,
    JoinSubreddit,
    LeaveSubreddit,
    CreatePost,
    CreateComment,
    Vote,
    SendDirectMessage,
    GetFeed,
    GetComments,
    GetDirectMessages,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::CreateUser => "create_user",
            Self::CreateSubreddit => "create_subreddit",
            Self::JoinSubreddit => "join_subreddit",
            Self::LeaveSubreddit => "leave_subreddit",
            Self::CreatePost => "create_post",
            Self::CreateComment => "create_comment",
            Self::Vote => "vote",
            Self::SendDirectMessage => "send_direct_message",
            Self::GetFeed => "get_feed",
            Self::GetComments => "get_comments",
            Self::GetDirectMessages => "get_direct_messages",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observability contract. Injected into the engine at construction.
///
/// Calls are fire-and-forget; an implementation must never fail or block.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait EngineMetrics: Send + Sync {
    fn user_registered(&self);
    fn post_created(&self, subreddit_id: &str);
    fn comment_created(&self);
    fn vote_recorded(&self);
    fn message_sent(&self);
    fn subreddit_members(&self, subreddit_id: &str, count: usize);
    fn request_failed(&self, kind: RequestKind);
    fn request_completed(&self, kind: RequestKind, elapsed: Duration);
}

/// Discards everything. Handy for tests and for running without an exporter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl EngineMetrics for NoopMetrics {
    fn user_registered(&self) {}
    fn post_created(&self, _subreddit_id: &str) {}
    fn comment_created(&self) {}
    fn vote_recorded(&self) {}
    fn message_sent(&self) {}
    fn subreddit_members(&self, _subreddit_id: &str, _count: usize) {}
    fn request_failed(&self, _kind: RequestKind) {}
    fn request_completed(&self, _kind: RequestKind, _elapsed: Duration) {}
}
