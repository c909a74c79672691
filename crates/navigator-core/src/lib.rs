pub mod ai;
pub mod config;
pub mod conversation;
pub mod curriculum;
pub mod navigator;
pub mod prompts;
pub mod prose;
pub mod segmenter;
pub mod state;
pub mod topic;

// Re-export main types for convenience
pub use ai::{GeminiClient, GeminiError, GeminiTutor, Tutor};
pub use config::Config;
pub use conversation::{ConversationPhase, ConversationStore, QueryRequest};
pub use curriculum::{CurriculumSection, CURRICULUM};
pub use navigator::{CallFailure, Completion, Navigator};
pub use segmenter::{segment, ContentBlock, Segments};
pub use state::{Message, RequestToken, Role};
pub use topic::{TopicPhase, TopicRequest, TopicStore};
