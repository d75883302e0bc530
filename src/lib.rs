//! Capture Catalog Server Library
//!
//! This library exposes the internal modules for testing and reuse by the binaries.

pub mod capture_store;
pub mod captures;
pub mod config;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use capture_store::{CaptureStore, SqliteCaptureStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserManager, UserRole, UserStore};
