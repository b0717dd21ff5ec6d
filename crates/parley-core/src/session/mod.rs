//! Session bindings and the registry that owns them.
//!
//! A binding is the transient link between a session key and its generation
//! context. Bindings hold no durable state and may be evicted and rebuilt at
//! any time.

pub mod binding;
pub mod registry;
