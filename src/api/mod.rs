mod attendance;
mod auth;
mod materials;
mod schedules;
mod users;

use axum::extract::{FromRequest, FromRequestParts};
use axum::routing::{get, post};
use axum::{Router, extract::State, http::StatusCode};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body whose rejections render as `AppError` (400).
///
/// Handlers that must authorize before looking at the body take
/// `Result<Payload<T>, AppError>` and unwrap it after the policy check.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Payload<T>(pub T);

/// Query string counterpart of [`Payload`], taken the same way.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Params<T>(pub T);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/schedules", get(schedules::list).post(schedules::create))
        .route(
            "/schedules/{id}",
            get(schedules::detail)
                .patch(schedules::update)
                .delete(schedules::remove),
        )
        .route("/attendance", get(attendance::list))
        .route("/attendance/me", get(attendance::mine))
        .route("/attendance/{id}", post(attendance::submit).delete(attendance::remove))
        .route("/materials", get(materials::list).post(materials::create))
        .route(
            "/materials/{id}",
            get(materials::detail)
                .patch(materials::update)
                .delete(materials::remove),
        )
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/{id}",
            get(users::detail).patch(users::update).delete(users::remove),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}
