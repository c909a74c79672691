//! Owns the two stores and runs their collaborator calls.
//!
//! Store transitions only happen on the caller's task (the UI loop). Remote
//! calls run on spawned tokio tasks that never touch store state; they send a
//! [`Completion`] back through a channel, and the UI loop feeds it to
//! [`Navigator::apply`] in whatever order completions arrive.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::ai::Tutor;
use crate::conversation::{ConversationStore, QueryRequest};
use crate::curriculum;
use crate::state::RequestToken;
use crate::topic::{TopicRequest, TopicStore};

/// A collaborator call that ended without producing text (the task panicked
/// or was cancelled).
#[derive(Debug, Clone, Error)]
#[error("collaborator call failed: {0}")]
pub struct CallFailure(pub String);

#[derive(Debug)]
pub enum Completion {
    Topic {
        token: RequestToken,
        outcome: Result<String, CallFailure>,
    },
    Answer {
        token: RequestToken,
        outcome: Result<String, CallFailure>,
    },
}

pub struct Navigator {
    topics: TopicStore,
    conversation: ConversationStore,
    tutor: Arc<dyn Tutor>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl Navigator {
    /// Create a navigator and the receiver its completions arrive on.
    pub fn new(tutor: Arc<dyn Tutor>) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let navigator = Self {
            topics: TopicStore::new(),
            conversation: ConversationStore::new(),
            tutor,
            completions: tx,
        };
        (navigator, rx)
    }

    pub fn topics(&self) -> &TopicStore {
        &self.topics
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    /// Returns `true` when a fetch was dispatched.
    pub fn select_topic(&mut self, topic: &str) -> bool {
        if !curriculum::is_topic(topic) {
            warn!(topic, "ignoring selection of unknown topic");
            return false;
        }

        let Some(TopicRequest { token, topic }) = self.topics.select_topic(topic) else {
            return false;
        };

        info!(topic = %topic, %token, "selected topic");
        let tutor = Arc::clone(&self.tutor);
        self.spawn_call(
            async move { tutor.fetch_topic_content(&topic).await },
            move |outcome| Completion::Topic { token, outcome },
        );
        true
    }

    /// Returns `true` when the message was accepted; the caller should then
    /// clear its input buffer.
    pub fn send_message(&mut self, text: &str) -> bool {
        let Some(QueryRequest {
            token,
            query,
            history,
            thinking_mode,
        }) = self.conversation.send_message(text)
        else {
            return false;
        };

        debug!(%token, thinking_mode, "dispatching query");
        let tutor = Arc::clone(&self.tutor);
        self.spawn_call(
            async move { tutor.answer_query(&query, &history, thinking_mode).await },
            move |outcome| Completion::Answer { token, outcome },
        );
        true
    }

    pub fn set_thinking_mode(&mut self, enabled: bool) {
        debug!(enabled, "thinking mode");
        self.conversation.set_thinking_mode(enabled);
    }

    pub fn toggle_thinking_mode(&mut self) -> bool {
        let enabled = !self.conversation.thinking_mode();
        self.set_thinking_mode(enabled);
        enabled
    }

    /// Apply a finished call to its store. Returns `false` if it was stale.
    pub fn apply(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::Topic { token, outcome } => match outcome {
                Ok(body) => self.topics.finish(token, body),
                Err(e) => {
                    error!(%token, error = %e, "topic fetch failed");
                    self.topics.fail(token)
                }
            },
            Completion::Answer { token, outcome } => match outcome {
                Ok(answer) => self.conversation.receive_answer(token, answer),
                Err(e) => {
                    error!(%token, error = %e, "query failed");
                    self.conversation.fail(token)
                }
            },
        }
    }

    fn spawn_call<F, W>(&self, call: F, wrap: W)
    where
        F: Future<Output = String> + Send + 'static,
        W: FnOnce(Result<String, CallFailure>) -> Completion + Send + 'static,
    {
        let tx = self.completions.clone();
        tokio::spawn(async move {
            // Inner task so a panicking collaborator still produces a completion
            let outcome = tokio::spawn(call)
                .await
                .map_err(|e| CallFailure(e.to_string()));
            if tx.send(wrap(outcome)).is_err() {
                debug!("completion receiver dropped");
            }
        });
    }
}
