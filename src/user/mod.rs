pub mod auth;
mod error;
mod memory_user_store;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use auth::{Claims, CredentialsHasher, TokenIssuer, TokenPair, TokenSettings};
pub use error::{UserError, UserResult};
pub use memory_user_store::InMemoryUserStore;
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::UserManager;
pub use user_models::{CreateUserRequest, UpdatePasswordRequest, User, UserResponse};
pub use user_store::UserStore;
