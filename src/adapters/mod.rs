//! Adapters layer: Concrete implementations of ports.
//!
//! - `sqlite`: SQLite-backed assessment history
//! - `sanitize`: identifier and credential redaction for logs

pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::{SqliteStore, StorageError};
