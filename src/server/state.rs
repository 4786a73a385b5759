use axum::extract::FromRef;

use crate::catalog_store::CatalogStore;
use crate::identity::IdentityVerifier;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedUserManager = Arc<UserManager>;
pub type OptionalIdentityVerifier = Option<Arc<dyn IdentityVerifier>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub user_manager: GuardedUserManager,
    pub identity_verifier: OptionalIdentityVerifier,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        user_manager: GuardedUserManager,
        identity_verifier: OptionalIdentityVerifier,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            user_manager,
            identity_verifier,
        }
    }
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for OptionalIdentityVerifier {
    fn from_ref(input: &ServerState) -> Self {
        input.identity_verifier.clone()
    }
}
