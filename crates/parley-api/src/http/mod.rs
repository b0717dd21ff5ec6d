//! HTTP API for Parley.
//!
//! Axum routes under `/api/` with flat JSON bodies, a plain-text streaming
//! turn endpoint, and CORS support.

pub mod error;
pub mod handlers;
pub mod router;
pub mod sink;

#[cfg(test)]
mod tests;
