//! Generation capability abstractions for Parley.
//!
//! - `LlmProvider`: object-safe trait producing a lazy fragment stream
//! - `PromptTemplate`: renders the prior transcript and new input into a prompt

pub mod prompt;
pub mod provider;
