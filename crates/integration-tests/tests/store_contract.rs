//! Behavior every `ContentStore` implementation must show, exercised through
//! the trait object the engine holds.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rr_core::error::DomainError;
use rr_core::models::{Comment, Post, Subreddit, User};
use rr_core::traits::ContentStore;
use rr_store_memory::MemoryStore;

fn store() -> Arc<dyn ContentStore> {
    Arc::new(MemoryStore::new())
}

fn post(id: &str) -> Post {
    Post {
        id: id.into(),
        subreddit_id: "s1".into(),
        author_id: "u1".into(),
        title: "First time posting here".into(),
        content: "This is really interesting...".into(),
        karma: 0,
        created_at: Utc::now(),
        votes: HashMap::new(),
    }
}

#[tokio::test]
async fn duplicates_leave_state_untouched() {
    let store = store();
    let user = User {
        id: "u1".into(),
        username: "original".into(),
        password: "pw".into(),
        created_at: Utc::now(),
    };
    store.create_user(user.clone()).await.unwrap();
    let err = store
        .create_user(User {
            username: "second".into(),
            ..user
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AlreadyExists("user", ref id) if id == "u1"));
    assert_eq!(store.get_user("u1").await.unwrap().username, "original");

    let subreddit = Subreddit {
        id: "s1".into(),
        name: "r_tech_discussion_1".into(),
        description: "tech".into(),
        creator_id: "u1".into(),
        members: HashSet::new(),
        created_at: Utc::now(),
    };
    store.create_subreddit(subreddit.clone()).await.unwrap();
    store.join_subreddit("s1", "u1").await.unwrap();
    assert!(store.create_subreddit(subreddit).await.is_err());
    assert_eq!(store.get_subreddit("s1").await.unwrap().members.len(), 1);

    store.create_post(post("p1")).await.unwrap();
    store.vote("p1", "u2", true).await.unwrap();
    assert!(store.create_post(post("p1")).await.is_err());
    assert_eq!(store.get_post("p1").await.unwrap().karma, 1);

    let comment = Comment {
        id: "c1".into(),
        post_id: "p1".into(),
        parent_id: None,
        author_id: "u1".into(),
        content: "first".into(),
        created_at: Utc::now(),
    };
    store.add_comment(comment.clone()).await.unwrap();
    let err = store
        .add_comment(Comment {
            content: "second".into(),
            ..comment
        })
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::already_exists("comment", "c1"));
    assert_eq!(store.get_comments("p1").await.unwrap()[0].content, "first");
}

#[tokio::test]
async fn karma_matches_latest_vote_per_voter() {
    let store = store();
    store.create_post(post("p1")).await.unwrap();

    let sequence = [
        ("a", true),
        ("b", true),
        ("a", false),
        ("c", false),
        ("b", true),
        ("c", true),
        ("a", false),
        ("d", false),
    ];
    let mut latest = HashMap::new();
    for (voter, up) in sequence {
        store.vote("p1", voter, up).await.unwrap();
        latest.insert(voter, up);
    }

    let expected: i64 = latest.values().map(|&up| if up { 1 } else { -1 }).sum();
    assert_eq!(store.get_post("p1").await.unwrap().karma, expected);
    assert_eq!(expected, 0);
}
