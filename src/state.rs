use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{AuthService, PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::UserDirectory;
use crate::middleware::AuthorizationGate;

/// Shared handler state. Everything in here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub gate: Arc<AuthorizationGate>,
    pub pool: PgPool,
}

impl AppState {
    pub fn new(config: &AppConfig, pool: PgPool, directory: Arc<dyn UserDirectory>) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.security));
        let hasher = PasswordHasher::new(config.security.bcrypt_cost);

        Self {
            auth: Arc::new(AuthService::new(directory.clone(), tokens.clone(), hasher)),
            gate: Arc::new(AuthorizationGate::new(tokens, directory)),
            pool,
        }
    }
}
