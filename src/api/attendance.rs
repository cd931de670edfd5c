use axum::{Json, extract::{Path, State}, http::StatusCode};
use tracing::info;

use super::{Params, Payload};
use crate::auth::{CurrentUser, Operation, authorize};
use crate::db::{attendance, schedules};
use crate::error::AppError;
use crate::models::{Attendance, AttendanceQuery, MySchedule, SubmitAttendanceRequest};
use crate::state::AppState;

/// Staff view across all students.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    filter: Result<Params<AttendanceQuery>, AppError>,
) -> Result<Json<Vec<Attendance>>, AppError> {
    authorize(&claims, Operation::AttendanceReadAll)?;
    let Params(filter) = filter?;
    Ok(Json(attendance::fetch_attendance(&state.db, &filter).await?))
}

pub async fn mine(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Vec<MySchedule>>, AppError> {
    authorize(&claims, Operation::AttendanceReadOwn)?;
    Ok(Json(schedules::fetch_schedules_for_user(&state.db, &claims.sub).await?))
}

/// The student is always the caller; a user id in the body is never read.
pub async fn submit(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(schedule_id): Path<String>,
    body: Result<Payload<SubmitAttendanceRequest>, AppError>,
) -> Result<(StatusCode, Json<Attendance>), AppError> {
    authorize(&claims, Operation::AttendanceSubmit)?;
    let Payload(req) = body?;
    let status = req.validate()?;

    let record = attendance::submit_attendance(&state.db, &claims.sub, &schedule_id, status).await?;
    info!(attendance_id = %record.id, schedule_id = %schedule_id, user_id = %claims.sub, "attendance submitted");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Attendance>, AppError> {
    authorize(&claims, Operation::AttendanceDelete)?;
    let record = attendance::soft_delete_attendance(&state.db, &id, &claims.sub)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(attendance_id = %id, actor = %claims.sub, "attendance voided");
    Ok(Json(record))
}
