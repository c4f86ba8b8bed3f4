use axum::extract::FromRef;

use crate::library::LibraryStore;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

/// Both stores synchronize internally, so handlers share them without an
/// outer lock.
pub type GuardedLibraryStore = Arc<dyn LibraryStore>;
pub type GuardedUserManager = Arc<UserManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub library: GuardedLibraryStore,
    pub user_manager: GuardedUserManager,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        library: GuardedLibraryStore,
        user_manager: GuardedUserManager,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            library,
            user_manager,
        }
    }
}

impl FromRef<ServerState> for GuardedLibraryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.library.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}
