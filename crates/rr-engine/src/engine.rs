//! # Request Router
//!
//! Turns each typed request into store/query calls and shapes the outcome
//! into a `Response`. This is the only place domain errors become responses.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rr_core::error::{DomainError, Result};
use rr_core::models::{Comment, DirectMessage, Post, Subreddit, User};
use rr_core::traits::{ContentStore, EngineMetrics, RequestKind};
use tracing::{debug, info_span, warn, Instrument};

use crate::protocol::{PostView, Request, Response};
use crate::query::{self, CommentTree};

/// Tunables for the read side.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub score_floor_hours: f64,
    /// Used when a feed request carries no limit of its own.
    pub default_feed_limit: Option<usize>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            score_floor_hours: query::DEFAULT_SCORE_FLOOR_HOURS,
            default_feed_limit: None,
        }
    }
}

/// State shared by every request the engine handles.
pub struct Engine {
    store: Arc<dyn ContentStore>,
    metrics: Arc<dyn EngineMetrics>,
    settings: EngineSettings,
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::ValidationFailure(format!("{field} must not be empty")));
    }
    Ok(())
}

impl Engine {
    pub fn new(store: Arc<dyn ContentStore>, metrics: Arc<dyn EngineMetrics>) -> Self {
        Self {
            store,
            metrics,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Handles one request. Never fails: errors come back as `Response::Error`.
    pub async fn handle(&self, request: Request) -> Response {
        let kind = request.kind();
        if kind == RequestKind::Ping {
            return Response::Pong;
        }

        let start = Instant::now();
        let outcome = self
            .dispatch(request)
            .instrument(info_span!("request", kind = %kind))
            .await;

        match outcome {
            Ok(response) => {
                self.metrics.request_completed(kind, start.elapsed());
                response
            }
            Err(err) => {
                warn!(request = %kind, error = %err, "request failed");
                self.metrics.request_failed(kind);
                Response::error(err.to_string())
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Response> {
        match request {
            Request::Ping => Ok(Response::Pong),
            Request::CreateUser {
                id,
                username,
                password,
            } => self.create_user(id, username, password).await,
            Request::CreateSubreddit {
                id,
                name,
                description,
                creator_id,
            } => self.create_subreddit(id, name, description, creator_id).await,
            Request::JoinSubreddit {
                subreddit_id,
                user_id,
            } => self.join_subreddit(&subreddit_id, &user_id).await,
            Request::LeaveSubreddit {
                subreddit_id,
                user_id,
            } => self.leave_subreddit(&subreddit_id, &user_id).await,
            Request::CreatePost {
                id,
                subreddit_id,
                author_id,
                title,
                content,
            } => {
                let post = Post {
                    id,
                    subreddit_id,
                    author_id,
                    title,
                    content,
                    karma: 0,
                    created_at: Utc::now(),
                    votes: Default::default(),
                };
                self.create_post(post).await
            }
            Request::CreateComment {
                id,
                post_id,
                parent_id,
                author_id,
                content,
            } => {
                let comment = Comment {
                    id,
                    post_id,
                    parent_id: parent_id.filter(|p| !p.is_empty()),
                    author_id,
                    content,
                    created_at: Utc::now(),
                };
                self.create_comment(comment).await
            }
            Request::Vote {
                target_id,
                user_id,
                is_upvote,
            } => self.vote(&target_id, &user_id, is_upvote).await,
            Request::SendDirectMessage {
                id,
                from_id,
                to_id,
                content,
                reply_to_id,
            } => {
                let message = DirectMessage {
                    id,
                    from_id,
                    to_id,
                    content,
                    created_at: Utc::now(),
                    reply_to_id: reply_to_id.filter(|r| !r.is_empty()),
                };
                self.send_direct_message(message).await
            }
            Request::GetFeed {
                subreddit_ids,
                limit,
            } => self.get_feed(&subreddit_ids, limit).await,
            Request::GetComments { post_id } => self.get_comments(&post_id).await,
            Request::GetDirectMessages { user_id } => self.get_direct_messages(&user_id).await,
        }
    }

    async fn create_user(&self, id: String, username: String, password: String) -> Result<Response> {
        require("id", &id)?;
        let user = User {
            id,
            username,
            password,
            created_at: Utc::now(),
        };
        self.store.create_user(user).await?;
        self.metrics.user_registered();
        Ok(Response::success("User registered successfully"))
    }

    async fn create_subreddit(
        &self,
        id: String,
        name: String,
        description: String,
        creator_id: String,
    ) -> Result<Response> {
        require("id", &id)?;
        let subreddit = Subreddit {
            id: id.clone(),
            name,
            description,
            creator_id,
            members: HashSet::new(),
            created_at: Utc::now(),
        };
        self.store.create_subreddit(subreddit).await?;
        self.metrics.subreddit_members(&id, 0);
        Ok(Response::success("Subreddit created successfully"))
    }

    async fn join_subreddit(&self, subreddit_id: &str, user_id: &str) -> Result<Response> {
        require("subreddit_id", subreddit_id)?;
        require("user_id", user_id)?;
        let members = self.store.join_subreddit(subreddit_id, user_id).await?;
        self.metrics.subreddit_members(subreddit_id, members);
        Ok(Response::success("Joined subreddit successfully"))
    }

    async fn leave_subreddit(&self, subreddit_id: &str, user_id: &str) -> Result<Response> {
        require("subreddit_id", subreddit_id)?;
        require("user_id", user_id)?;
        let members = self.store.leave_subreddit(subreddit_id, user_id).await?;
        self.metrics.subreddit_members(subreddit_id, members);
        Ok(Response::success("Left subreddit successfully"))
    }

    async fn create_post(&self, post: Post) -> Result<Response> {
        require("id", &post.id)?;
        require("subreddit_id", &post.subreddit_id)?;
        let subreddit_id = post.subreddit_id.clone();
        self.store.create_post(post).await?;
        self.metrics.post_created(&subreddit_id);
        Ok(Response::success("Post created successfully"))
    }

    async fn create_comment(&self, comment: Comment) -> Result<Response> {
        require("id", &comment.id)?;
        require("post_id", &comment.post_id)?;
        self.store.add_comment(comment).await?;
        self.metrics.comment_created();
        Ok(Response::success("Comment created successfully"))
    }

    async fn vote(&self, target_id: &str, user_id: &str, is_upvote: bool) -> Result<Response> {
        require("target_id", target_id)?;
        require("user_id", user_id)?;
        let karma = self.store.vote(target_id, user_id, is_upvote).await?;
        debug!(target = %target_id, ?karma, "vote applied");
        self.metrics.vote_recorded();
        Ok(Response::success("Vote recorded successfully"))
    }

    async fn send_direct_message(&self, message: DirectMessage) -> Result<Response> {
        require("id", &message.id)?;
        require("to_id", &message.to_id)?;
        self.store.send_message(message).await?;
        self.metrics.message_sent();
        Ok(Response::success("Message sent successfully"))
    }

    async fn get_feed(&self, subreddit_ids: &[String], limit: Option<usize>) -> Result<Response> {
        let mut posts = Vec::new();
        for subreddit_id in query::distinct_ids(subreddit_ids) {
            posts.extend(self.store.get_subreddit_posts(subreddit_id).await?);
        }

        let limit = limit.or(self.settings.default_feed_limit);
        let ranked = query::rank_feed(posts, Utc::now(), self.settings.score_floor_hours, limit);
        debug!(subreddits = subreddit_ids.len(), posts = ranked.len(), "feed assembled");
        Ok(Response::Feed {
            posts: ranked.into_iter().map(PostView::from).collect(),
        })
    }

    async fn get_comments(&self, post_id: &str) -> Result<Response> {
        require("post_id", post_id)?;
        let comments = self.store.get_comments(post_id).await?;
        let tree = CommentTree::build(comments);
        Ok(Response::Comments {
            comments: tree.into_root_views(),
        })
    }

    async fn get_direct_messages(&self, user_id: &str) -> Result<Response> {
        let messages = self.store.get_messages(user_id).await?;
        Ok(Response::DirectMessages { messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use rr_core::traits::{MockContentStore, MockEngineMetrics, NoopMetrics};
    use rr_store_memory::MemoryStore;

    fn engine() -> (Engine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(store.clone(), Arc::new(NoopMetrics));
        (engine, store)
    }

    fn create_user(id: &str) -> Request {
        Request::CreateUser {
            id: id.into(),
            username: "testuser".into(),
            password: "password123".into(),
        }
    }

    fn create_post(id: &str, subreddit_id: &str) -> Request {
        Request::CreatePost {
            id: id.into(),
            subreddit_id: subreddit_id.into(),
            author_id: "user1".into(),
            title: "Test Post".into(),
            content: "This is a test post".into(),
        }
    }

    fn vote(target: &str, user: &str, up: bool) -> Request {
        Request::Vote {
            target_id: target.into(),
            user_id: user.into(),
            is_upvote: up,
        }
    }

    fn comment(id: &str, parent: Option<&str>) -> Request {
        Request::CreateComment {
            id: id.into(),
            post_id: "post1".into(),
            parent_id: parent.map(Into::into),
            author_id: "user1".into(),
            content: "hello".into(),
        }
    }

    #[tokio::test]
    async fn ping_answers_pong_without_the_store() {
        // No expectations: any store or metrics call would panic.
        let engine = Engine::new(Arc::new(MockContentStore::new()), Arc::new(MockEngineMetrics::new()));
        assert_eq!(engine.handle(Request::Ping).await, Response::Pong);
    }

    #[tokio::test]
    async fn registers_user() {
        let (engine, store) = engine();
        let response = engine.handle(create_user("user1")).await;
        assert_eq!(response, Response::success("User registered successfully"));
        assert_eq!(store.get_user("user1").await.unwrap().username, "testuser");
    }

    #[tokio::test]
    async fn duplicate_user_becomes_error_response() {
        let (engine, _) = engine();
        engine.handle(create_user("user1")).await;
        let response = engine.handle(create_user("user1")).await;
        assert_eq!(response, Response::error("user already exists: user1"));
    }

    #[tokio::test]
    async fn empty_id_fails_validation_before_the_store() {
        let engine = Engine::new(Arc::new(MockContentStore::new()), Arc::new(NoopMetrics));
        let response = engine.handle(create_user("  ")).await;
        assert_eq!(response, Response::error("validation failure: id must not be empty"));
    }

    #[tokio::test]
    async fn join_unknown_subreddit_fails() {
        let (engine, _) = engine();
        let response = engine
            .handle(Request::JoinSubreddit {
                subreddit_id: "s1".into(),
                user_id: "u1".into(),
            })
            .await;
        assert_eq!(response, Response::error("subreddit not found: s1"));
    }

    #[tokio::test]
    async fn join_and_leave_round_trip() {
        let (engine, store) = engine();
        let create = Request::CreateSubreddit {
            id: "s1".into(),
            name: "rust".into(),
            description: "crabs".into(),
            creator_id: "u1".into(),
        };
        let join = Request::JoinSubreddit {
            subreddit_id: "s1".into(),
            user_id: "u2".into(),
        };
        let leave = Request::LeaveSubreddit {
            subreddit_id: "s1".into(),
            user_id: "u2".into(),
        };

        assert_eq!(engine.handle(create).await, Response::success("Subreddit created successfully"));
        assert_eq!(engine.handle(join.clone()).await, Response::success("Joined subreddit successfully"));
        assert_eq!(engine.handle(join).await, Response::success("Joined subreddit successfully"));
        assert_eq!(store.get_subreddit("s1").await.unwrap().members.len(), 1);
        assert_eq!(engine.handle(leave.clone()).await, Response::success("Left subreddit successfully"));
        assert_eq!(engine.handle(leave).await, Response::success("Left subreddit successfully"));
        assert!(store.get_subreddit("s1").await.unwrap().members.is_empty());
    }

    #[tokio::test]
    async fn upvote_then_downvote_leaves_minus_one() {
        let (engine, store) = engine();
        engine.handle(create_post("post1", "s1")).await;

        assert_eq!(engine.handle(vote("post1", "a", true)).await, Response::success("Vote recorded successfully"));
        assert_eq!(store.get_post("post1").await.unwrap().karma, 1);
        engine.handle(vote("post1", "a", false)).await;
        assert_eq!(store.get_post("post1").await.unwrap().karma, -1);
    }

    #[tokio::test]
    async fn feed_is_ranked_across_subreddits() {
        let (engine, _) = engine();
        engine.handle(create_post("p-low", "s1")).await;
        engine.handle(create_post("p-high", "s2")).await;
        engine.handle(create_post("p-mid", "s1")).await;
        engine.handle(create_post("p-other", "s3")).await;
        for voter in 0..10 {
            engine.handle(vote("p-high", &format!("v{voter}"), true)).await;
        }
        for voter in 0..5 {
            engine.handle(vote("p-mid", &format!("v{voter}"), true)).await;
        }
        engine.handle(vote("p-low", "v0", true)).await;

        let response = engine
            .handle(Request::GetFeed {
                subreddit_ids: vec!["s1".into(), "s2".into()],
                limit: None,
            })
            .await;
        let Response::Feed { posts } = response else {
            panic!("expected a feed, got {response:?}");
        };
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p-high", "p-mid", "p-low"]);
        assert_eq!(posts[0].karma, 10);
    }

    #[tokio::test]
    async fn feed_limit_and_default_limit() {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(store, Arc::new(NoopMetrics)).with_settings(EngineSettings {
            default_feed_limit: Some(1),
            ..EngineSettings::default()
        });
        engine.handle(create_post("a", "s1")).await;
        engine.handle(create_post("b", "s1")).await;
        engine.handle(create_post("c", "s1")).await;

        let feed = |limit| Request::GetFeed {
            subreddit_ids: vec!["s1".into()],
            limit,
        };
        let Response::Feed { posts } = engine.handle(feed(None)).await else {
            panic!("expected a feed");
        };
        assert_eq!(posts.len(), 1);
        let Response::Feed { posts } = engine.handle(feed(Some(2))).await else {
            panic!("expected a feed");
        };
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn feed_aborts_on_store_error() {
        let mut store = MockContentStore::new();
        store
            .expect_get_subreddit_posts()
            .returning(|_| Err(DomainError::Internal("shard unavailable".into())));
        let mut metrics = MockEngineMetrics::new();
        metrics
            .expect_request_failed()
            .with(eq(RequestKind::GetFeed))
            .times(1)
            .return_const(());
        metrics.expect_request_completed().never();

        let engine = Engine::new(Arc::new(store), Arc::new(metrics));
        let response = engine
            .handle(Request::GetFeed {
                subreddit_ids: vec!["s1".into(), "s2".into()],
                limit: None,
            })
            .await;
        assert_eq!(response, Response::error("internal error: shard unavailable"));
    }

    #[tokio::test]
    async fn comments_return_roots_only() {
        let (engine, _) = engine();
        engine.handle(comment("c1", None)).await;
        engine.handle(comment("c2", Some("c1"))).await;
        engine.handle(comment("c3", Some("nonexistent"))).await;

        let response = engine
            .handle(Request::GetComments {
                post_id: "post1".into(),
            })
            .await;
        let Response::Comments { comments } = response else {
            panic!("expected comments, got {response:?}");
        };
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "c1");
        assert_eq!(comments[0].children, ["c2"]);
    }

    #[tokio::test]
    async fn inbox_lookup_for_unknown_user_is_empty() {
        let (engine, _) = engine();
        let response = engine
            .handle(Request::GetDirectMessages {
                user_id: "ghost".into(),
            })
            .await;
        assert_eq!(response, Response::DirectMessages { messages: Vec::new() });
    }

    #[tokio::test]
    async fn direct_messages_arrive_in_order() {
        let (engine, _) = engine();
        for (id, reply) in [("m1", None), ("m2", Some("m1"))] {
            let response = engine
                .handle(Request::SendDirectMessage {
                    id: id.into(),
                    from_id: "user1".into(),
                    to_id: "user2".into(),
                    content: format!("Hello from {id}"),
                    reply_to_id: reply.map(Into::into),
                })
                .await;
            assert_eq!(response, Response::success("Message sent successfully"));
        }

        let Response::DirectMessages { messages } = engine
            .handle(Request::GetDirectMessages {
                user_id: "user2".into(),
            })
            .await
        else {
            panic!("expected messages");
        };
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hello from m1");
        assert_eq!(messages[1].reply_to_id.as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn successful_mutations_feed_metrics() {
        let mut metrics = MockEngineMetrics::new();
        metrics.expect_user_registered().times(1).return_const(());
        metrics.expect_post_created().times(1).return_const(());
        metrics.expect_vote_recorded().times(2).return_const(());
        metrics.expect_comment_created().times(1).return_const(());
        metrics
            .expect_request_failed()
            .with(eq(RequestKind::CreateUser))
            .times(1)
            .return_const(());
        metrics.expect_request_completed().times(5).return_const(());

        let engine = Engine::new(Arc::new(MemoryStore::new()), Arc::new(metrics));
        engine.handle(create_user("u1")).await;
        engine.handle(create_user("u1")).await;
        engine.handle(create_post("post1", "s1")).await;
        engine.handle(vote("post1", "u1", true)).await;
        engine.handle(vote("post1", "u1", true)).await;
        engine.handle(comment("c1", None)).await;
    }
}
