use axum::extract::FromRef;

use crate::capture_store::CaptureStore;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCaptureStore = Arc<dyn CaptureStore>;
pub type GuardedUserManager = Arc<UserManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub capture_store: GuardedCaptureStore,
    pub user_manager: GuardedUserManager,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        capture_store: GuardedCaptureStore,
        user_manager: GuardedUserManager,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            capture_store,
            user_manager,
            hash: option_env!("GIT_HASH").unwrap_or("local").to_string(),
        }
    }
}

impl FromRef<ServerState> for GuardedCaptureStore {
    fn from_ref(input: &ServerState) -> Self {
        input.capture_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}
