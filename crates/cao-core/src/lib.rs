//! Domain types for the cao terminal assistant.
//!
//! Everything here is synchronous and I/O free: personas, the conversation
//! context, configuration and the shared error type. Storage lives in
//! `cao-infrastructure`, networking and the session engine in
//! `cao-interaction`.

pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod persona;
pub mod repository;
pub mod session;

// Re-export common error type
pub use error::{CaoError, Result};
