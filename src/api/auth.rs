use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Value, json};

use super::Payload;
use crate::auth::CurrentUser;
use crate::auth::extract::{expired_session_cookie, session_cookie};
use crate::db::users;
use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, NewUserRequest, User};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Payload(req): Payload<NewUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.identity().register(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Payload(req): Payload<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let login = state.identity().login(req).await?;
    let cookie = session_cookie(login.token.clone(), state.tokens.ttl_secs(), state.cookie_secure);
    Ok((jar.add(cookie), Json(login)))
}

/// Clears the cookie. The token itself stays valid until it expires.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    (
        jar.add(expired_session_cookie(state.cookie_secure)),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<User>, AppError> {
    let user = users::find_user(&state.db, &claims.sub)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}
