//! Conversation transcript persistence.
//!
//! - `TranscriptStore`: the partitioned document store port
//! - `MemoryTranscriptStore`: in-process implementation (tests, ephemeral runs)
//! - `TranscriptHandle`: a store accessor bound to one conversation

pub mod handle;
pub mod memory;
pub mod store;
