use sqlx::SqlitePool;
use uuid::Uuid;

use super::{Table, mark_deleted, now};
use crate::models::{MySchedule, NewSchedule, Schedule, ScheduleChanges};

macro_rules! select_schedule {
    () => {
        r#"
        SELECT
            s.id, s.title, s.description, s.date, s.created_by,
            u.name AS creator_name,
            u.email AS creator_email,
            s.deleted, s.deleted_at, s.deleted_by, s.created_at, s.updated_at
        FROM schedules s
        LEFT JOIN users u ON u.id = s.created_by
        "#
    };
}

pub async fn fetch_schedules(db: &SqlitePool) -> Result<Vec<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(concat!(
        select_schedule!(),
        "WHERE s.deleted = 0 ORDER BY s.date DESC, s.created_at DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn find_schedule(db: &SqlitePool, id: &str) -> Result<Option<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(concat!(select_schedule!(), "WHERE s.id = ?1 AND s.deleted = 0"))
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn find_schedule_any_state(db: &SqlitePool, id: &str) -> Result<Option<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(concat!(select_schedule!(), "WHERE s.id = ?1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_schedule(
    db: &SqlitePool,
    new: NewSchedule,
    actor_id: &str,
) -> Result<Schedule, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO schedules
            (id, title, description, date, created_by, deleted, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
        "#,
    )
    .bind(&id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.date)
    .bind(actor_id)
    .bind(&now)
    .execute(db)
    .await?;

    find_schedule(db, &id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_schedule(
    db: &SqlitePool,
    id: &str,
    changes: ScheduleChanges,
) -> Result<Option<Schedule>, sqlx::Error> {
    let mut current = match find_schedule(db, id).await? {
        Some(s) => s,
        None => return Ok(None),
    };

    if let Some(title) = changes.title {
        current.title = title;
    }
    if let Some(description) = changes.description {
        current.description = description;
    }
    if let Some(date) = changes.date {
        current.date = date;
    }
    current.updated_at = now();

    Ok(store_schedule(db, &current).await?.then_some(current))
}

/// Writes the editable fields back. False when the row was deleted meanwhile.
async fn store_schedule(db: &SqlitePool, schedule: &Schedule) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE schedules
        SET title = ?1,
            description = ?2,
            date = ?3,
            updated_at = ?4
        WHERE id = ?5 AND deleted = 0
        "#,
    )
    .bind(&schedule.title)
    .bind(&schedule.description)
    .bind(&schedule.date)
    .bind(&schedule.updated_at)
    .bind(&schedule.id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn soft_delete_schedule(
    db: &SqlitePool,
    id: &str,
    actor_id: &str,
) -> Result<Option<Schedule>, sqlx::Error> {
    if !mark_deleted(db, Table::Schedules, id, actor_id).await? {
        return Ok(None);
    }
    find_schedule_any_state(db, id).await
}

/// Live schedules, each flagged with `user_id`'s own live submission.
pub async fn fetch_schedules_for_user(
    db: &SqlitePool,
    user_id: &str,
) -> Result<Vec<MySchedule>, sqlx::Error> {
    sqlx::query_as::<_, MySchedule>(
        r#"
        SELECT
            s.id, s.title, s.description, s.date, s.created_by,
            u.name AS creator_name,
            u.email AS creator_email,
            s.deleted, s.deleted_at, s.deleted_by, s.created_at, s.updated_at,
            a.id IS NOT NULL AS already_attended,
            a.status AS attendance_status
        FROM schedules s
        LEFT JOIN users u ON u.id = s.created_by
        LEFT JOIN attendance a
            ON a.schedule_id = s.id AND a.user_id = ?1 AND a.deleted = 0
        WHERE s.deleted = 0
        ORDER BY s.date DESC, s.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
