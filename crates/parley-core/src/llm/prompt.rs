//! Prompt template for conversational turns.
//!
//! The prior transcript is rendered one message per line as
//! `Speaker: content` and substituted, together with the new human input,
//! into a template with `{chat_history}` and `{human_input}` placeholders.

use parley_types::chat::ChatMessage;

const CHAT_HISTORY: &str = "{chat_history}";
const HUMAN_INPUT: &str = "{human_input}";

/// Default turn template: history, newline, new input.
pub const DEFAULT_TEMPLATE: &str = "{chat_history}\n{human_input}";

/// A turn prompt template.
///
/// Substitution is single-pass: placeholder text that appears inside the
/// transcript or the input is emitted literally, never expanded again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Render the prompt for one turn.
    pub fn render(&self, history: &[ChatMessage], human_input: &str) -> String {
        let chat_history = render_history(history);
        let mut out = String::with_capacity(self.template.len() + chat_history.len() + human_input.len());

        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            if let Some(after) = tail.strip_prefix(CHAT_HISTORY) {
                out.push_str(&chat_history);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(HUMAN_INPUT) {
                out.push_str(human_input);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// Render a transcript as `Human: ...` / `AI: ...` lines joined by newlines.
pub fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.speaker(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
