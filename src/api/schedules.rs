use axum::{Json, extract::{Path, State}, http::StatusCode};
use chrono::Utc;
use tracing::info;

use super::Payload;
use crate::auth::{CurrentUser, Operation, authorize};
use crate::db::schedules;
use crate::error::AppError;
use crate::models::{NewScheduleRequest, Schedule, UpdateScheduleRequest};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Vec<Schedule>>, AppError> {
    authorize(&claims, Operation::ScheduleRead)?;
    Ok(Json(schedules::fetch_schedules(&state.db).await?))
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Schedule>, AppError> {
    authorize(&claims, Operation::ScheduleRead)?;
    let schedule = schedules::find_schedule(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(schedule))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    body: Result<Payload<NewScheduleRequest>, AppError>,
) -> Result<(StatusCode, Json<Schedule>), AppError> {
    authorize(&claims, Operation::ScheduleCreate)?;
    let Payload(req) = body?;
    let new = req.validate(Utc::now())?;

    let schedule = schedules::insert_schedule(&state.db, new, &claims.sub).await?;
    info!(schedule_id = %schedule.id, actor = %claims.sub, "schedule created");
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    body: Result<Payload<UpdateScheduleRequest>, AppError>,
) -> Result<Json<Schedule>, AppError> {
    authorize(&claims, Operation::ScheduleUpdate)?;
    let Payload(req) = body?;
    let changes = req.validate(Utc::now())?;

    let schedule = schedules::update_schedule(&state.db, &id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(schedule_id = %id, actor = %claims.sub, "schedule updated");
    Ok(Json(schedule))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Schedule>, AppError> {
    authorize(&claims, Operation::ScheduleDelete)?;
    let schedule = schedules::soft_delete_schedule(&state.db, &id, &claims.sub)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(schedule_id = %id, actor = %claims.sub, "schedule deleted");
    Ok(Json(schedule))
}
