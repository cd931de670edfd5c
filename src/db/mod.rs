//! Repositories over the SQLite store.
//!
//! Every table carries `deleted`, `deleted_at` and `deleted_by`. Rows are never
//! removed; lookups and listings filter on `deleted = 0`.

pub mod attendance;
pub mod materials;
pub mod schedules;
pub mod users;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::models::validation::format_timestamp;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub(crate) fn now() -> String {
    format_timestamp(Utc::now())
}

/// Tables that follow the soft-delete convention.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Table {
    Users,
    Schedules,
    Attendance,
    Materials,
}

impl Table {
    fn as_str(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Schedules => "schedules",
            Table::Attendance => "attendance",
            Table::Materials => "materials",
        }
    }
}

/// Marks a live row deleted and stamps the actor. Returns false when the row
/// is absent or already deleted, so the audit fields are written once.
pub(crate) async fn mark_deleted(
    db: &SqlitePool,
    table: Table,
    id: &str,
    actor_id: &str,
) -> Result<bool, sqlx::Error> {
    let now = now();
    let sql = format!(
        "UPDATE {} SET deleted = 1, deleted_at = ?1, deleted_by = ?2, updated_at = ?1 WHERE id = ?3 AND deleted = 0",
        table.as_str()
    );

    let result = sqlx::query(&sql)
        .bind(&now)
        .bind(actor_id)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
