//! Chat history with the tutor.
//!
//! Two states, `Ready` and `Awaiting`. At most one query is in flight: a send
//! while awaiting is refused rather than queued.

use crate::state::{Message, RequestToken, Role};
use tracing::{debug, warn};

/// First message of every conversation
pub const GREETING: &str = "Hello! Ask me anything about Ansible.";

/// Appended as the model's reply when the query task itself failed.
pub const ANSWER_FALLBACK: &str =
    "I apologize, but I encountered an error while processing your request. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPhase {
    Ready,
    Awaiting,
}

/// A query the caller must dispatch. `history` is the conversation as it was
/// before the new user message, and `thinking_mode` is fixed at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub token: RequestToken,
    pub query: String,
    pub history: Vec<Message>,
    pub thinking_mode: bool,
}

#[derive(Debug)]
pub struct ConversationStore {
    history: Vec<Message>,
    thinking_mode: bool,
    pending: Option<RequestToken>,
    last_token: RequestToken,
    next_id: u64,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let mut store = Self {
            history: Vec::new(),
            thinking_mode: false,
            pending: None,
            last_token: RequestToken::default(),
            next_id: 0,
        };
        store.append(Role::Model, GREETING);
        store
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn thinking_mode(&self) -> bool {
        self.thinking_mode
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn phase(&self) -> ConversationPhase {
        if self.is_loading() {
            ConversationPhase::Awaiting
        } else {
            ConversationPhase::Ready
        }
    }

    /// Append the user's message and return the query to dispatch. Refused
    /// (returns `None`, history untouched) for blank input or while awaiting.
    pub fn send_message(&mut self, text: &str) -> Option<QueryRequest> {
        if text.trim().is_empty() {
            return None;
        }
        if let Some(pending) = self.pending {
            debug!(%pending, "query already in flight, ignoring send");
            return None;
        }

        let history = self.history.clone();
        self.append(Role::User, text);

        self.last_token = self.last_token.next();
        self.pending = Some(self.last_token);

        Some(QueryRequest {
            token: self.last_token,
            query: text.to_string(),
            history,
            thinking_mode: self.thinking_mode,
        })
    }

    /// Append the model's answer for the outstanding query.
    pub fn receive_answer(&mut self, token: RequestToken, text: String) -> bool {
        if self.pending != Some(token) {
            warn!(%token, "ignoring answer for a query that is not outstanding");
            return false;
        }
        self.append(Role::Model, text);
        self.pending = None;
        true
    }

    /// The query task died; answer with the fixed apology.
    pub fn fail(&mut self, token: RequestToken) -> bool {
        self.receive_answer(token, ANSWER_FALLBACK.to_string())
    }

    /// Only affects queries dispatched after the change.
    pub fn set_thinking_mode(&mut self, enabled: bool) {
        self.thinking_mode = enabled;
    }

    fn append(&mut self, role: Role, text: impl Into<String>) {
        self.next_id += 1;
        // Zero-padded so ids sort lexically in creation order
        let id = format!("msg-{:08}", self.next_id);
        self.history.push(Message::new(id, role, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_ready_with_greeting() {
        let store = ConversationStore::new();
        assert_eq!(store.phase(), ConversationPhase::Ready);
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].role(), Role::Model);
        assert_eq!(store.history()[0].text(), GREETING);
        assert!(!store.thinking_mode());
    }

    #[test]
    fn test_send_then_answer_appends_in_order() {
        let mut store = ConversationStore::new();
        let request = store.send_message("hi").expect("accepted");
        assert_eq!(store.phase(), ConversationPhase::Awaiting);
        assert_eq!(request.query, "hi");
        assert_eq!(request.history.len(), 1, "prior history excludes the new message");

        assert!(store.receive_answer(request.token, "hello there".into()));
        let history = store.history();
        assert_eq!(history.len(), 3);
        assert_eq!((history[1].role(), history[1].text()), (Role::User, "hi"));
        assert_eq!((history[2].role(), history[2].text()), (Role::Model, "hello there"));
        assert_eq!(store.phase(), ConversationPhase::Ready);
    }

    #[test]
    fn test_blank_messages_are_rejected() {
        let mut store = ConversationStore::new();
        assert!(store.send_message("").is_none());
        assert!(store.send_message("   ").is_none());
        assert!(store.send_message("\n\t").is_none());
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.phase(), ConversationPhase::Ready);
    }

    #[test]
    fn test_single_flight() {
        let mut store = ConversationStore::new();
        let first = store.send_message("first").unwrap();
        assert!(store.send_message("second").is_none());
        assert_eq!(store.history().len(), 2);

        store.receive_answer(first.token, "answer".into());
        assert!(store.send_message("second").is_some());
    }

    #[test]
    fn test_failure_appends_apology_and_unblocks() {
        let mut store = ConversationStore::new();
        let request = store.send_message("why?").unwrap();
        assert!(store.fail(request.token));
        assert_eq!(store.history().last().map(|m| m.text()), Some(ANSWER_FALLBACK));
        assert_eq!(store.history().last().map(|m| m.role()), Some(Role::Model));
        assert!(!store.is_loading());
    }

    #[test]
    fn test_unknown_token_is_ignored() {
        let mut store = ConversationStore::new();
        let request = store.send_message("q").unwrap();
        assert!(!store.receive_answer(request.token.next(), "bogus".into()));
        assert!(store.is_loading());
        assert!(store.receive_answer(request.token, "real".into()));
        // a duplicate delivery after completion is ignored too
        assert!(!store.receive_answer(request.token, "again".into()));
        assert_eq!(store.history().len(), 3);
    }

    #[test]
    fn test_thinking_mode_is_captured_at_dispatch() {
        let mut store = ConversationStore::new();
        store.set_thinking_mode(true);
        let request = store.send_message("deep question").unwrap();
        store.set_thinking_mode(false);
        assert!(request.thinking_mode);
        assert!(!store.thinking_mode());
    }

    #[test]
    fn test_message_ids_sort_by_creation() {
        let mut store = ConversationStore::new();
        for i in 0..12 {
            let request = store.send_message(&format!("q{i}")).unwrap();
            store.receive_answer(request.token, format!("a{i}"));
        }
        let ids: Vec<_> = store.history().iter().map(|m| m.id().to_string()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
