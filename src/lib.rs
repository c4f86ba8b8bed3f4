//! Home Library Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod library;
pub mod logging;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use library::{InMemoryLibraryStore, LibraryStore, SqliteLibraryStore};
pub use server::{make_app, run_server, RequestsLoggingLevel};
pub use user::{InMemoryUserStore, SqliteUserStore, UserManager, UserStore};
