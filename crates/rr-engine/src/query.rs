//! Read-side assembly: feed ranking and comment trees.
//!
//! Everything here is a pure function over data already fetched from the
//! store, so results never leak into stored records.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rr_core::models::{Comment, Post};

use crate::protocol::CommentView;

pub const DEFAULT_SCORE_FLOOR_HOURS: f64 = 2.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// `karma / max(age_hours, floor_hours)`.
pub fn relevance_score(post: &Post, now: DateTime<Utc>, floor_hours: f64) -> f64 {
    let age_hours = (now - post.created_at).num_milliseconds() as f64 / MILLIS_PER_HOUR;
    post.karma as f64 / age_hours.max(floor_hours)
}

/// Sorts `posts` by descending relevance and keeps the first `limit`.
///
/// The sort is stable, so equal scores keep their collection order.
pub fn rank_feed(
    posts: Vec<Post>,
    now: DateTime<Utc>,
    floor_hours: f64,
    limit: Option<usize>,
) -> Vec<Post> {
    let mut scored: Vec<(f64, Post)> = posts
        .into_iter()
        .map(|post| (relevance_score(&post, now, floor_hours), post))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let ranked = scored.into_iter().map(|(_, post)| post);
    match limit {
        Some(n) => ranked.take(n).collect(),
        None => ranked.collect(),
    }
}

/// Removes repeated subreddit ids, keeping first occurrences in order.
pub fn distinct_ids(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Parent/child structure of one post's comments, rebuilt per query.
#[derive(Debug, Default)]
pub struct CommentTree {
    roots: Vec<Comment>,
    children: HashMap<String, Vec<String>>,
}

impl CommentTree {
    /// Builds the tree from a flat, unordered set of comments.
    ///
    /// Comments whose parent is not in the set are dropped: they are neither
    /// roots nor anybody's child.
    pub fn build(mut comments: Vec<Comment>) -> Self {
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let known: HashSet<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for comment in &comments {
            if let Some(parent) = comment.parent() {
                if known.contains(parent) {
                    children
                        .entry(parent.to_owned())
                        .or_default()
                        .push(comment.id.clone());
                }
            }
        }

        let roots = comments.into_iter().filter(Comment::is_root).collect();
        Self { roots, children }
    }

    pub fn roots(&self) -> &[Comment] {
        &self.roots
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Root comments, each carrying the ids of its direct replies.
    pub fn into_root_views(mut self) -> Vec<CommentView> {
        self.roots
            .into_iter()
            .map(|root| CommentView {
                children: self.children.remove(&root.id).unwrap_or_default(),
                id: root.id,
                post_id: root.post_id,
                parent_id: root.parent_id,
                author_id: root.author_id,
                content: root.content,
                created_at: root.created_at,
            })
            .collect()
    }
}
