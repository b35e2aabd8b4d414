//! In-process mailbox in front of an [`Engine`].
//!
//! A single task owns the engine and drains a bounded queue, so requests are
//! handled one at a time in arrival order. Callers talk to it through a
//! cloneable [`EngineHandle`] and get the response back on a oneshot channel.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::Engine;
use crate::protocol::{Request, Response};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    #[error("engine '{0}' is not running")]
    Closed(String),

    #[error("engine '{0}' stopped before answering")]
    NoReply(String),
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Named endpoint for submitting requests to a running engine.
///
/// The engine task stops once every handle is dropped.
#[derive(Clone)]
pub struct EngineHandle {
    name: Arc<str>,
    tx: mpsc::Sender<Envelope>,
}

impl EngineHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues `request` and waits for the engine's answer.
    pub async fn request(&self, request: Request) -> Result<Response, MailboxError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| MailboxError::Closed(self.name.to_string()))?;
        response
            .await
            .map_err(|_| MailboxError::NoReply(self.name.to_string()))
    }

    /// Reachability check. `Ok(true)` when the engine answered `Pong`.
    pub async fn ping(&self) -> Result<bool, MailboxError> {
        Ok(matches!(self.request(Request::Ping).await?, Response::Pong))
    }
}

/// Starts the engine task and returns its handle.
///
/// `capacity` bounds the queue; once full, `request` waits for room.
pub fn spawn(engine: Engine, name: impl Into<String>, capacity: usize) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let name: Arc<str> = Arc::from(name.into());
    let task = tokio::spawn(run(engine, Arc::clone(&name), rx));
    (EngineHandle { name, tx }, task)
}

async fn run(engine: Engine, name: Arc<str>, mut inbox: mpsc::Receiver<Envelope>) {
    info!(engine = %name, "engine started");
    while let Some(Envelope { request, reply }) = inbox.recv().await {
        let response = engine.handle(request).await;
        if reply.send(response).is_err() {
            debug!(engine = %name, "caller went away before the response was ready");
        }
    }
    info!(engine = %name, "engine stopped");
}
