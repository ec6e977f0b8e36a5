//! One live conversation: the selected domain, its message log and the
//! Idle / AwaitingReply state machine around the completion call.
//!
//! A send is split in two so the network call can run without holding the
//! session: [`ChatSession::submit`] records the user message and hands back a
//! [`PendingReply`], and [`ChatSession::deliver`] appends the resolved reply.
//! Navigating away cancels the in-flight request and bumps the session
//! generation, so a reply that still arrives afterwards is discarded.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::completion::{CompletionClient, FallbackMessages};
use crate::conversation::{ConversationStore, Message};
use crate::domain::Domain;
use crate::error::SessionError;
use crate::prompt::PromptComposer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
}

pub struct ChatSession {
    domain: Domain,
    composer: Arc<PromptComposer>,
    client: Arc<dyn CompletionClient>,
    fallbacks: FallbackMessages,
    store: ConversationStore,
    state: SessionState,
    generation: u64,
    cancel: CancellationToken,
}

/// An outbound request that has not resolved yet. Owns everything it needs,
/// so it can be awaited on any task.
pub struct PendingReply {
    generation: u64,
    prompt: String,
    client: Arc<dyn CompletionClient>,
    cancel: CancellationToken,
    fallback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplyOutcome {
    Text(String),
    Cancelled,
}

/// A resolved [`PendingReply`], ready for [`ChatSession::deliver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    generation: u64,
    outcome: ReplyOutcome,
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            ReplyOutcome::Text(text) => Some(text),
            ReplyOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == ReplyOutcome::Cancelled
    }
}

impl PendingReply {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Performs the completion call. Resolves early with a cancelled reply
    /// when the owning session navigates away.
    pub async fn resolve(self) -> Reply {
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => ReplyOutcome::Cancelled,
            result = self.client.complete(&self.prompt) => match result {
                Ok(text) => ReplyOutcome::Text(text),
                Err(e) => {
                    error!(error = %e, "Completion client failed, using fallback reply");
                    ReplyOutcome::Text(self.fallback.clone())
                }
            },
        };
        Reply {
            generation: self.generation,
            outcome,
        }
    }
}

impl ChatSession {
    pub fn new(domain: Domain, composer: Arc<PromptComposer>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            domain,
            composer,
            client,
            fallbacks: FallbackMessages::default(),
            store: ConversationStore::new(),
            state: SessionState::Idle,
            generation: 0,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_fallbacks(mut self, fallbacks: FallbackMessages) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.store.snapshot()
    }

    /// Records the user's message and prepares the request for it.
    ///
    /// Rejects blank input and a second send while a reply is outstanding.
    pub fn submit(&mut self, text: &str) -> Result<PendingReply, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.state == SessionState::AwaitingReply {
            warn!(domain = %self.domain, "Send rejected while awaiting reply");
            return Err(SessionError::ReplyPending);
        }

        self.store.append(Message::user(text));
        self.state = SessionState::AwaitingReply;
        debug!(domain = %self.domain, generation = self.generation, "Submitted user message");

        Ok(PendingReply {
            generation: self.generation,
            prompt: self.composer.compose(self.domain, text),
            client: Arc::clone(&self.client),
            cancel: self.cancel.child_token(),
            fallback: self.fallbacks.generic.clone(),
        })
    }

    /// Appends the assistant message for `reply` and returns to Idle.
    ///
    /// Replies from before the last navigation are dropped and `None` is
    /// returned.
    pub fn deliver(&mut self, reply: Reply) -> Option<&Message> {
        if reply.generation != self.generation {
            debug!(
                reply_generation = reply.generation,
                generation = self.generation,
                "Discarding reply from a previous conversation"
            );
            return None;
        }
        if self.state != SessionState::AwaitingReply {
            warn!("Discarding reply with no outstanding request");
            return None;
        }

        // Cancellation only comes from `reset`, which also moves to a new
        // generation, so a cancelled reply never gets this far.
        let ReplyOutcome::Text(text) = reply.outcome else {
            return None;
        };
        self.store.append(Message::assistant(text));
        self.state = SessionState::Idle;
        self.store.last()
    }

    /// Submit, resolve and deliver in one go.
    pub async fn send(&mut self, text: &str) -> Result<Option<&Message>, SessionError> {
        let pending = self.submit(text)?;
        let reply = pending.resolve().await;
        Ok(self.deliver(reply))
    }

    /// Back to an empty conversation, cancelling any in-flight request.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
        self.store.clear();
        self.state = SessionState::Idle;
    }

    /// Switches to `domain` with a fresh conversation.
    pub fn navigate(&mut self, domain: Domain) {
        info!(from = %self.domain, to = %domain, "Switching domain");
        self.reset();
        self.domain = domain;
    }
}
