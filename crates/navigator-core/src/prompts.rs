//! Prompt text sent to the model.

use crate::state::Message;

pub const TUTOR_SYSTEM_INSTRUCTION: &str = "You are an expert Ansible instructor and troubleshooter. \
Provide clear, accurate, and concise answers to the user's questions. \
Use markdown for formatting and provide YAML code examples when helpful.";

/// Lesson request for one curriculum subtopic
pub fn topic_prompt(topic: &str) -> String {
    format!(
        "You are an expert Ansible instructor. Your student wants to learn about \"{topic}\".

Provide a detailed, clear, and comprehensive explanation suitable for a beginner to mid-level developer.
Structure your response with the following sections:
- A brief introduction to the concept.
- Core principles and key details, using bullet points or numbered lists.
- Practical examples using YAML code blocks where appropriate.
- A concluding summary of the key takeaways.

Format your response using markdown. Ensure code blocks are properly formatted with ```yaml."
    )
}

/// Flatten the prior conversation into `role: text` lines followed by the new query.
pub fn conversation_prompt(history: &[Message], query: &str) -> String {
    let mut prompt = String::new();

    for msg in history {
        prompt.push_str(msg.role().as_str());
        prompt.push_str(": ");
        prompt.push_str(msg.text());
        prompt.push('\n');
    }

    prompt.push_str("user: ");
    prompt.push_str(query);
    prompt
}
