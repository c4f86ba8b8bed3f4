//! The library: artists, albums, tracks and the favorites that point at them.

mod cascade;
mod collection;
mod error;
mod favorites;
mod id;
mod memory_store;
mod models;
mod schema;
mod sqlite_store;
mod state;
mod trait_def;

pub use cascade::{CascadePlan, CascadeReport};
pub use collection::Collection;
pub use error::{LibraryError, LibraryResult};
pub use favorites::Favorites;
pub use id::EntityId;
pub use memory_store::InMemoryLibraryStore;
pub use models::*;
pub use schema::LIBRARY_VERSIONED_SCHEMAS;
pub use sqlite_store::SqliteLibraryStore;
pub use state::LibraryState;
pub use trait_def::LibraryStore;
