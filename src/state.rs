use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::TokenService;
use crate::config::Config;
use crate::services::IdentityService;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: Arc<TokenService>,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        Self {
            db,
            tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl_secs)),
            cookie_secure: config.cookie_secure,
        }
    }

    pub fn identity(&self) -> IdentityService {
        IdentityService::new(self.db.clone(), self.tokens.clone())
    }
}
