//! # rr-metrics-prometheus
//!
//! `EngineMetrics` backed by a `prometheus-client` registry.
//! The binary owns one instance and hands it to the engine; `encode` renders
//! the text exposition format for a `/metrics` endpoint.

use std::fmt;
use std::time::Duration;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use rr_core::traits::{EngineMetrics, RequestKind};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct SubredditLabels {
    subreddit: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct RequestLabels {
    request: String,
}

pub struct PrometheusMetrics {
    registry: Registry,
    users: Counter,
    posts: Counter,
    comments: Counter,
    votes: Counter,
    messages: Counter,
    subreddit_posts: Family<SubredditLabels, Counter>,
    subreddit_members: Family<SubredditLabels, Gauge>,
    errors: Family<RequestLabels, Counter>,
    request_duration: Histogram,
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("reddit");

        let users = Counter::default();
        let posts = Counter::default();
        let comments = Counter::default();
        let votes = Counter::default();
        let messages = Counter::default();
        let subreddit_posts = Family::<SubredditLabels, Counter>::default();
        let subreddit_members = Family::<SubredditLabels, Gauge>::default();
        let errors = Family::<RequestLabels, Counter>::default();
        // 1ms .. ~2s
        let request_duration = Histogram::new(exponential_buckets(0.001, 2.0, 12));

        registry.register("users", "Total number of registered users", users.clone());
        registry.register("posts", "Total number of posts created", posts.clone());
        registry.register("comments", "Total number of comments created", comments.clone());
        registry.register("votes", "Total number of votes recorded", votes.clone());
        registry.register("messages", "Total number of direct messages sent", messages.clone());
        registry.register("subreddit_posts", "Number of posts per subreddit", subreddit_posts.clone());
        registry.register("subreddit_members", "Number of members per subreddit", subreddit_members.clone());
        registry.register("errors", "Total number of failed requests", errors.clone());
        registry.register(
            "request_duration_seconds",
            "Request duration in seconds",
            request_duration.clone(),
        );

        Self {
            registry,
            users,
            posts,
            comments,
            votes,
            messages,
            subreddit_posts,
            subreddit_members,
            errors,
            request_duration,
        }
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

impl Default for PrometheusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics for PrometheusMetrics {
    fn user_registered(&self) {
        self.users.inc();
    }

    fn post_created(&self, subreddit_id: &str) {
        self.posts.inc();
        self.subreddit_posts
            .get_or_create(&SubredditLabels {
                subreddit: subreddit_id.to_owned(),
            })
            .inc();
    }

    fn comment_created(&self) {
        self.comments.inc();
    }

    fn vote_recorded(&self) {
        self.votes.inc();
    }

    fn message_sent(&self) {
        self.messages.inc();
    }

    fn subreddit_members(&self, subreddit_id: &str, count: usize) {
        self.subreddit_members
            .get_or_create(&SubredditLabels {
                subreddit: subreddit_id.to_owned(),
            })
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    fn request_failed(&self, kind: RequestKind) {
        self.errors
            .get_or_create(&RequestLabels {
                request: kind.as_str().to_owned(),
            })
            .inc();
    }

    fn request_completed(&self, _kind: RequestKind, elapsed: Duration) {
        self.request_duration.observe(elapsed.as_secs_f64());
    }
}
