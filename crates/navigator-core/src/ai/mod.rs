pub mod gemini;
pub mod tutor;

pub use gemini::{GeminiClient, GeminiError};
pub use tutor::{GeminiTutor, ModelSettings, Tutor};
