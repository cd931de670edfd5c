use sqlx::SqlitePool;
use uuid::Uuid;

use super::{Table, mark_deleted, now};
use crate::models::{Material, MaterialChanges, NewMaterial};

macro_rules! select_material {
    () => {
        r#"
        SELECT
            m.id, m.title, m.description, m.category, m.subject, m.priority,
            m.instructor_id,
            u.name AS instructor_name,
            u.email AS instructor_email,
            m.deleted, m.deleted_at, m.deleted_by, m.created_at, m.updated_at
        FROM materials m
        LEFT JOIN users u ON u.id = m.instructor_id
        "#
    };
}

pub async fn fetch_materials(db: &SqlitePool) -> Result<Vec<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(concat!(
        select_material!(),
        "WHERE m.deleted = 0 ORDER BY m.created_at DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn find_material(db: &SqlitePool, id: &str) -> Result<Option<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(concat!(select_material!(), "WHERE m.id = ?1 AND m.deleted = 0"))
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn find_material_any_state(db: &SqlitePool, id: &str) -> Result<Option<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(concat!(select_material!(), "WHERE m.id = ?1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_material(
    db: &SqlitePool,
    new: NewMaterial,
    actor_id: &str,
) -> Result<Material, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO materials
            (id, title, description, category, subject, priority,
            instructor_id, deleted, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
        "#,
    )
    .bind(&id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.category)
    .bind(&new.subject)
    .bind(new.priority)
    .bind(actor_id)
    .bind(&now)
    .execute(db)
    .await?;

    find_material(db, &id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_material(
    db: &SqlitePool,
    id: &str,
    changes: MaterialChanges,
) -> Result<Option<Material>, sqlx::Error> {
    let mut current = match find_material(db, id).await? {
        Some(m) => m,
        None => return Ok(None),
    };

    if let Some(title) = changes.title {
        current.title = title;
    }
    if let Some(description) = changes.description {
        current.description = description;
    }
    if let Some(category) = changes.category {
        current.category = category;
    }
    if let Some(subject) = changes.subject {
        current.subject = subject;
    }
    if let Some(priority) = changes.priority {
        current.priority = priority;
    }
    current.updated_at = now();

    Ok(store_material(db, &current).await?.then_some(current))
}

/// Writes the editable fields back. False when the row was deleted meanwhile.
async fn store_material(db: &SqlitePool, material: &Material) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE materials
        SET title = ?1,
            description = ?2,
            category = ?3,
            subject = ?4,
            priority = ?5,
            updated_at = ?6
        WHERE id = ?7 AND deleted = 0
        "#,
    )
    .bind(&material.title)
    .bind(&material.description)
    .bind(&material.category)
    .bind(&material.subject)
    .bind(material.priority)
    .bind(&material.updated_at)
    .bind(&material.id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn soft_delete_material(
    db: &SqlitePool,
    id: &str,
    actor_id: &str,
) -> Result<Option<Material>, sqlx::Error> {
    if !mark_deleted(db, Table::Materials, id, actor_id).await? {
        return Ok(None);
    }
    find_material_any_state(db, id).await
}
