use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use super::{Params, Payload};
use crate::auth::password::hash_password;
use crate::auth::{CurrentUser, Operation, Role, authorize, authorize_subject, can_perform};
use crate::db::users;
use crate::error::AppError;
use crate::models::validation::{normalize_email, provided};
use crate::models::{NewUserRequest, UpdateUserRequest, User, UserChanges, UserListQuery, UserProfile};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    query: Result<Params<UserListQuery>, AppError>,
) -> Result<Json<Vec<User>>, AppError> {
    authorize(&claims, Operation::UserRead)?;
    let Params(query) = query?;
    Ok(Json(users::fetch_users(&state.db, query.role).await?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    body: Result<Payload<NewUserRequest>, AppError>,
) -> Result<(StatusCode, Json<User>), AppError> {
    authorize(&claims, Operation::UserCreate)?;
    let Payload(req) = body?;
    let user = state.identity().create_user(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Administrators read anyone and every caller reads themselves. Otherwise
/// only a student's public profile is served; staff accounts read as absent.
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let user = users::find_user(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    if can_perform(claims.role, Operation::UserRead)
        || authorize_subject(&claims, Operation::UserReadSelf, &id).is_ok()
    {
        return Ok(Json(user).into_response());
    }

    authorize(&claims, Operation::UserReadProfile)?;
    if user.role.is_staff() {
        return Err(AppError::NotFound);
    }
    Ok(Json(UserProfile::from(user)).into_response())
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    body: Result<Payload<UpdateUserRequest>, AppError>,
) -> Result<Json<User>, AppError> {
    authorize(&claims, Operation::UserUpdate)?;
    let Payload(req) = body?;

    let changes = UserChanges {
        name: provided(req.name),
        email: provided(req.email).map(|e| normalize_email(&e)),
        role: provided(req.role).map(|r| r.parse::<Role>()).transpose()?,
        password_hash: req
            .password
            .filter(|p| !p.is_empty())
            .map(|p| hash_password(&p))
            .transpose()?,
    };
    if changes.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    let user = users::update_user(&state.db, &id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = %id, actor = %claims.sub, "user updated");
    Ok(Json(user))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    authorize(&claims, Operation::UserDelete)?;
    let user = users::soft_delete_user(&state.db, &id, &claims.sub)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = %id, actor = %claims.sub, "user deleted");
    Ok(Json(user))
}
