//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: the SQLite
//! transcript store, the runtime-selected store wrapper, generation providers
//! (OpenAI-compatible, Azure OpenAI, offline echo), and the configuration
//! loader.

pub mod config;
pub mod llm;
pub mod sqlite;
pub mod store;
