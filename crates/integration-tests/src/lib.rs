//! Shared fixtures for the integration test targets.

use std::sync::Arc;

use rr_engine::{Engine, EngineHandle, Request};
use rr_metrics_prometheus::PrometheusMetrics;
use rr_store_memory::MemoryStore;
use tokio::task::JoinHandle;

/// A running engine with direct access to its store and metrics.
pub struct TestEngine {
    pub handle: EngineHandle,
    pub store: Arc<MemoryStore>,
    pub metrics: Arc<PrometheusMetrics>,
    pub task: JoinHandle<()>,
}

pub fn start_engine() -> TestEngine {
    let store = Arc::new(MemoryStore::new());
    let metrics = Arc::new(PrometheusMetrics::new());
    let engine = Engine::new(store.clone(), metrics.clone());
    let (handle, task) = rr_engine::spawn(engine, "engine", 64);
    TestEngine {
        handle,
        store,
        metrics,
        task,
    }
}

pub fn create_user(id: &str) -> Request {
    Request::CreateUser {
        id: id.into(),
        username: format!("user_{id}"),
        password: "password123".into(),
    }
}

pub fn create_subreddit(id: &str, creator: &str) -> Request {
    Request::CreateSubreddit {
        id: id.into(),
        name: format!("r_{id}"),
        description: "integration".into(),
        creator_id: creator.into(),
    }
}

pub fn create_post(id: &str, subreddit_id: &str, author: &str) -> Request {
    Request::CreatePost {
        id: id.into(),
        subreddit_id: subreddit_id.into(),
        author_id: author.into(),
        title: "Just found this interesting thing".into(),
        content: "What do you think about this?".into(),
    }
}

pub fn vote(target: &str, user: &str, is_upvote: bool) -> Request {
    Request::Vote {
        target_id: target.into(),
        user_id: user.into(),
        is_upvote,
    }
}
