//! # rr-engine
//!
//! The domain request processor for Rusty-Reddit.
//!
//! - [`protocol`] defines the typed requests and responses.
//! - [`engine`] routes each request to the store and shapes the response.
//! - [`query`] ranks feeds and rebuilds comment trees.
//! - [`mailbox`] runs an engine behind a one-at-a-time request queue.

pub mod engine;
pub mod mailbox;
pub mod protocol;
pub mod query;

pub use engine::{Engine, EngineSettings};
pub use mailbox::{spawn, EngineHandle, MailboxError};
pub use protocol::{CommentView, PostView, Request, Response};
