use axum::{Json, extract::{Path, State}, http::StatusCode};
use tracing::info;

use super::Payload;
use crate::auth::{CurrentUser, Operation, authorize};
use crate::db::materials;
use crate::error::AppError;
use crate::models::{Material, MaterialRequest};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Material>>, AppError> {
    Ok(Json(materials::fetch_materials(&state.db).await?))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Material>, AppError> {
    let material = materials::find_material(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(material))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    body: Result<Payload<MaterialRequest>, AppError>,
) -> Result<(StatusCode, Json<Material>), AppError> {
    authorize(&claims, Operation::MaterialCreate)?;
    let Payload(req) = body?;
    let new = req.validate_new()?;

    let material = materials::insert_material(&state.db, new, &claims.sub).await?;
    info!(material_id = %material.id, actor = %claims.sub, "material created");
    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    body: Result<Payload<MaterialRequest>, AppError>,
) -> Result<Json<Material>, AppError> {
    authorize(&claims, Operation::MaterialUpdate)?;
    let Payload(req) = body?;
    let changes = req.validate_changes()?;

    let material = materials::update_material(&state.db, &id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(material_id = %id, actor = %claims.sub, "material updated");
    Ok(Json(material))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Material>, AppError> {
    authorize(&claims, Operation::MaterialDelete)?;
    let material = materials::soft_delete_material(&state.db, &id, &claims.sub)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(material_id = %id, actor = %claims.sub, "material deleted");
    Ok(Json(material))
}
