use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{Role, TokenService};
use crate::db::users;
use crate::error::AppError;
use crate::models::validation::{MissingFields, normalize_email};
use crate::models::{LoginRequest, LoginResponse, NewUser, NewUserRequest, User};

/// Registration, administrator account creation and login.
pub struct IdentityService {
    db: SqlitePool,
    tokens: Arc<TokenService>,
}

impl IdentityService {
    pub fn new(db: SqlitePool, tokens: Arc<TokenService>) -> Self {
        Self { db, tokens }
    }

    /// Self-service sign-up. Administrators cannot be self-registered.
    pub async fn register(&self, req: NewUserRequest) -> Result<User, AppError> {
        self.create(req, |role| role.is_self_registrable()).await
    }

    /// Account creation from the admin console; any role.
    pub async fn create_user(&self, req: NewUserRequest) -> Result<User, AppError> {
        self.create(req, |_| true).await
    }

    async fn create(&self, req: NewUserRequest, allowed: fn(Role) -> bool) -> Result<User, AppError> {
        let mut missing = MissingFields::default();
        let name = missing.take("name", req.name);
        let email = missing.take("email", req.email);
        let password = req.password.unwrap_or_default();
        if password.is_empty() {
            missing.take("password", None);
        }
        let role = missing.take("role", req.role);
        missing.check()?;

        let role: Role = role.parse()?;
        if !allowed(role) {
            return Err(AppError::InvalidRole(role.to_string()));
        }

        let email = normalize_email(&email);
        if users::email_taken(&self.db, &email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = users::insert_user(
            &self.db,
            NewUser {
                name,
                email,
                password_hash: hash_password(&password)?,
                role,
            },
        )
        .await?;

        info!(user_id = %user.id, role = %user.role, "account created");
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let mut missing = MissingFields::default();
        let email = missing.take("email", req.email);
        // passwords are compared verbatim, never trimmed
        let password = req.password.unwrap_or_default();
        if password.is_empty() {
            missing.take("password", None);
        }
        missing.check()?;

        let credential = users::find_credential_by_email(&self.db, &normalize_email(&email))
            .await?
            .ok_or(AppError::NotFound)?;

        if !verify_password(&password, &credential.password_hash)? {
            warn!(user_id = %credential.user.id, "login rejected: bad password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(&credential.user)?;
        info!(user_id = %credential.user.id, "login succeeded");

        Ok(LoginResponse {
            user: credential.user,
            token,
        })
    }
}
