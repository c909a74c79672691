//! Active topic and its fetched lesson body.
//!
//! `Idle -> Loading(topic) -> Ready(topic, body)`, with `select_topic` allowed
//! from any state. Completions are matched on the token issued at selection
//! time, so only the most recent selection can ever fill the body.

use crate::state::RequestToken;
use tracing::{debug, warn};

/// Shown in place of the lesson when the fetch task itself failed.
pub const CONTENT_FALLBACK: &str =
    "Sorry, I couldn't fetch the content for this topic. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicPhase<'a> {
    Idle,
    Loading { topic: &'a str },
    Ready { topic: &'a str, body: &'a str },
}

/// A content fetch the caller must dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRequest {
    pub token: RequestToken,
    pub topic: String,
}

#[derive(Debug, Default)]
pub struct TopicStore {
    active_topic: Option<String>,
    body: String,
    is_loading: bool,
    token: RequestToken,
}

impl TopicStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_topic(&self) -> Option<&str> {
        self.active_topic.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn phase(&self) -> TopicPhase<'_> {
        match (&self.active_topic, self.is_loading) {
            (None, _) => TopicPhase::Idle,
            (Some(topic), true) => TopicPhase::Loading { topic },
            (Some(topic), false) => TopicPhase::Ready {
                topic,
                body: &self.body,
            },
        }
    }

    /// Make `topic` active. Returns the fetch to dispatch, or `None` when the
    /// topic is already active (loading or loaded).
    pub fn select_topic(&mut self, topic: &str) -> Option<TopicRequest> {
        if self.active_topic.as_deref() == Some(topic) {
            debug!(topic, "topic already active, not refetching");
            return None;
        }

        self.token = self.token.next();
        self.active_topic = Some(topic.to_string());
        self.body.clear();
        self.is_loading = true;

        Some(TopicRequest {
            token: self.token,
            topic: topic.to_string(),
        })
    }

    /// Apply a fetched body. Returns `false` when the result was stale and discarded.
    pub fn finish(&mut self, token: RequestToken, body: String) -> bool {
        if !self.accepts(token) {
            return false;
        }
        self.body = body;
        self.is_loading = false;
        true
    }

    /// The fetch for `token` died; show the fallback text instead.
    pub fn fail(&mut self, token: RequestToken) -> bool {
        self.finish(token, CONTENT_FALLBACK.to_string())
    }

    fn accepts(&self, token: RequestToken) -> bool {
        if token != self.token || !self.is_loading {
            warn!(
                %token,
                current = %self.token,
                "discarding stale topic content"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let store = TopicStore::new();
        assert_eq!(store.phase(), TopicPhase::Idle);
        assert!(!store.is_loading());
        assert_eq!(store.body(), "");
    }

    #[test]
    fn test_select_then_finish() {
        let mut store = TopicStore::new();
        let request = store.select_topic("Ansible Facts").expect("first selection fetches");
        assert_eq!(request.topic, "Ansible Facts");
        assert_eq!(store.phase(), TopicPhase::Loading { topic: "Ansible Facts" });

        assert!(store.finish(request.token, "## Facts".to_string()));
        assert_eq!(
            store.phase(),
            TopicPhase::Ready {
                topic: "Ansible Facts",
                body: "## Facts"
            }
        );
    }

    #[test]
    fn test_reselecting_active_topic_is_noop() {
        let mut store = TopicStore::new();
        assert!(store.select_topic("Variable Precedence").is_some());
        assert!(store.select_topic("Variable Precedence").is_none());
    }

    #[test]
    fn test_reselecting_loaded_topic_is_noop() {
        let mut store = TopicStore::new();
        let request = store.select_topic("Loops (loop, with_items)").unwrap();
        store.finish(request.token, "body".into());
        assert!(store.select_topic("Loops (loop, with_items)").is_none());
        assert_eq!(store.body(), "body");
    }

    #[test]
    fn test_loading_clears_body() {
        let mut store = TopicStore::new();
        let first = store.select_topic("A").unwrap();
        store.finish(first.token, "first body".into());
        store.select_topic("B").unwrap();
        assert!(store.is_loading());
        assert_eq!(store.body(), "");
    }

    #[test]
    fn test_stale_result_is_discarded_in_either_order() {
        // B completes first, then A's late result arrives
        let mut store = TopicStore::new();
        let a = store.select_topic("A").unwrap();
        let b = store.select_topic("B").unwrap();
        assert!(store.finish(b.token, "B body".into()));
        assert!(!store.finish(a.token, "A body".into()));
        assert_eq!(store.body(), "B body");

        // A completes first while B is still loading
        let mut store = TopicStore::new();
        let a = store.select_topic("A").unwrap();
        let b = store.select_topic("B").unwrap();
        assert!(!store.finish(a.token, "A body".into()));
        assert!(store.is_loading());
        assert_eq!(store.body(), "");
        assert!(store.finish(b.token, "B body".into()));
        assert_eq!(store.phase(), TopicPhase::Ready { topic: "B", body: "B body" });
    }

    #[test]
    fn test_back_to_previous_topic_refetches() {
        let mut store = TopicStore::new();
        let a = store.select_topic("A").unwrap();
        store.select_topic("B").unwrap();
        let a_again = store.select_topic("A").unwrap();
        assert!(a_again.token > a.token);
        // the first fetch for A is stale even though the topic matches
        assert!(!store.finish(a.token, "old A".into()));
        assert!(store.finish(a_again.token, "new A".into()));
        assert_eq!(store.body(), "new A");
    }

    #[test]
    fn test_failure_shows_fallback() {
        let mut store = TopicStore::new();
        let request = store.select_topic("Error Handling").unwrap();
        assert!(store.fail(request.token));
        assert!(!store.is_loading());
        assert_eq!(store.body(), CONTENT_FALLBACK);
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut store = TopicStore::new();
        let a = store.select_topic("A").unwrap();
        store.select_topic("B").unwrap();
        assert!(!store.fail(a.token));
        assert!(store.is_loading());
    }
}
