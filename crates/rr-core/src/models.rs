//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Reddit.
//! Ids are opaque strings chosen by the client; timestamps are UTC.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// A community (e.g., r/rust). Members are added and removed only
/// through join/leave on the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subreddit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub creator_id: String,
    pub members: HashSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Subreddit {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }
}

/// A submission inside a subreddit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub subreddit_id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    /// Upvotes minus downvotes over `votes`, kept in step on every vote.
    pub karma: i64,
    pub created_at: DateTime<Utc>,
    /// user_id -> true for upvote, false for downvote
    pub votes: HashMap<String, bool>,
}

impl Post {
    /// Records `user_id`'s vote and returns the karma delta it caused.
    ///
    /// A first vote moves karma by one, a flipped vote by two, and a repeat
    /// of the same direction not at all.
    pub fn apply_vote(&mut self, user_id: &str, is_upvote: bool) -> i64 {
        let delta = vote_delta(self.votes.insert(user_id.to_owned(), is_upvote), is_upvote);
        self.karma += delta;
        delta
    }
}

/// Karma change for replacing `previous` with `is_upvote`.
pub fn vote_delta(previous: Option<bool>, is_upvote: bool) -> i64 {
    let weight = |up: bool| if up { 1 } else { -1 };
    match previous {
        None => weight(is_upvote),
        Some(prev) if prev == is_upvote => 0,
        Some(_) => 2 * weight(is_upvote),
    }
}

/// A reply on a post, either top-level or nested under another comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    /// `None` (or an empty string from older clients) marks a root comment.
    pub parent_id: Option<String>,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// The parent id, with empty strings treated as absent.
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }
}

/// A private message, filed under its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub reply_to_id: Option<String>,
}
