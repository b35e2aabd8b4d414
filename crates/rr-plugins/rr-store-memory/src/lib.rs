//! # rr-store-memory
//!
//! Volatile, in-process implementation of `ContentStore`.
//!
//! Every entity kind lives in its own `DashMap`. A map entry is the unit of
//! locking: a vote takes the write guard of its post entry, so the vote set
//! and the karma it feeds are updated in one critical section, while votes on
//! other posts proceed on other shards. No guard is ever held across an
//! `.await` or while touching a second map.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rr_core::error::{DomainError, Result};
use rr_core::models::{Comment, DirectMessage, Post, Subreddit, User};
use rr_core::traits::ContentStore;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    subreddits: DashMap<String, Subreddit>,
    posts: DashMap<String, Post>,
    comments: DashMap<String, Comment>,
    /// Inboxes keyed by recipient id, in delivery order.
    messages: DashMap<String, Vec<DirectMessage>>,
    /// Votes on targets that are not posts (e.g. comments).
    /// Post votes live on the post itself.
    votes: DashMap<String, HashMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded vote of `user_id` on `target_id`, if any.
    pub fn vote_of(&self, target_id: &str, user_id: &str) -> Option<bool> {
        if let Some(post) = self.posts.get(target_id) {
            return post.votes.get(user_id).copied();
        }
        self.votes
            .get(target_id)
            .and_then(|votes| votes.get(user_id).copied())
    }
}

/// Inserts `value` under `key` unless the key is taken.
fn insert_unique<V>(map: &DashMap<String, V>, kind: &'static str, key: String, value: V) -> Result<()> {
    match map.entry(key) {
        Entry::Occupied(entry) => Err(DomainError::already_exists(kind, entry.key().clone())),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_user(&self, user: User) -> Result<()> {
        debug!(id = %user.id, "create user");
        insert_unique(&self.users, "user", user.id.clone(), user)
    }

    async fn get_user(&self, id: &str) -> Result<User> {
        self.users
            .get(id)
            .map(|user| user.value().clone())
            .ok_or_else(|| DomainError::not_found("user", id))
    }

    async fn create_subreddit(&self, mut subreddit: Subreddit) -> Result<()> {
        debug!(id = %subreddit.id, "create subreddit");
        subreddit.members.clear();
        insert_unique(&self.subreddits, "subreddit", subreddit.id.clone(), subreddit)
    }

    async fn get_subreddit(&self, id: &str) -> Result<Subreddit> {
        self.subreddits
            .get(id)
            .map(|subreddit| subreddit.value().clone())
            .ok_or_else(|| DomainError::not_found("subreddit", id))
    }

    async fn join_subreddit(&self, subreddit_id: &str, user_id: &str) -> Result<usize> {
        let mut subreddit = self
            .subreddits
            .get_mut(subreddit_id)
            .ok_or_else(|| DomainError::not_found("subreddit", subreddit_id))?;
        subreddit.members.insert(user_id.to_owned());
        Ok(subreddit.members.len())
    }

    async fn leave_subreddit(&self, subreddit_id: &str, user_id: &str) -> Result<usize> {
        let mut subreddit = self
            .subreddits
            .get_mut(subreddit_id)
            .ok_or_else(|| DomainError::not_found("subreddit", subreddit_id))?;
        subreddit.members.remove(user_id);
        Ok(subreddit.members.len())
    }

    async fn create_post(&self, mut post: Post) -> Result<()> {
        debug!(id = %post.id, subreddit = %post.subreddit_id, "create post");
        post.karma = 0;
        post.votes.clear();
        insert_unique(&self.posts, "post", post.id.clone(), post)
    }

    async fn get_post(&self, id: &str) -> Result<Post> {
        self.posts
            .get(id)
            .map(|post| post.value().clone())
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    async fn get_subreddit_posts(&self, subreddit_id: &str) -> Result<Vec<Post>> {
        Ok(self
            .posts
            .iter()
            .filter(|post| post.subreddit_id == subreddit_id)
            .map(|post| post.value().clone())
            .collect())
    }

    async fn add_comment(&self, comment: Comment) -> Result<()> {
        debug!(id = %comment.id, post = %comment.post_id, "add comment");
        insert_unique(&self.comments, "comment", comment.id.clone(), comment)
    }

    async fn get_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        Ok(self
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .map(|comment| comment.value().clone())
            .collect())
    }

    async fn send_message(&self, message: DirectMessage) -> Result<()> {
        debug!(id = %message.id, to = %message.to_id, "send message");
        self.messages
            .entry(message.to_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn get_messages(&self, user_id: &str) -> Result<Vec<DirectMessage>> {
        Ok(self
            .messages
            .get(user_id)
            .map(|inbox| inbox.value().clone())
            .unwrap_or_default())
    }

    async fn vote(&self, target_id: &str, user_id: &str, is_upvote: bool) -> Result<Option<i64>> {
        if let Some(mut post) = self.posts.get_mut(target_id) {
            let delta = post.apply_vote(user_id, is_upvote);
            debug!(target = %target_id, user = %user_id, delta, karma = post.karma, "vote on post");
            return Ok(Some(post.karma));
        }

        self.votes
            .entry(target_id.to_owned())
            .or_default()
            .insert(user_id.to_owned(), is_upvote);
        debug!(target = %target_id, user = %user_id, "vote on non-post target");
        Ok(None)
    }
}
