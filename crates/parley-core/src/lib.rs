//! Business logic and port definitions for Parley.
//!
//! This crate defines the "ports" (transcript store, generation provider,
//! fragment sink) that the infrastructure layer implements, plus the session
//! registry, turn coordinator, and conversation catalog built on top of them.
//! It depends only on `parley-types` -- never on `parley-infra` or any
//! database/HTTP crate.

pub mod chat;
pub mod llm;
pub mod session;
pub mod transcript;

#[cfg(test)]
pub(crate) mod test_support;
