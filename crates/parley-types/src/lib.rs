//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley chat
//! backend: messages, conversations, session keys, generation requests,
//! configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, thiserror, secrecy.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
