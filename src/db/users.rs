use sqlx::SqlitePool;
use uuid::Uuid;

use super::{Table, mark_deleted, now};
use crate::auth::Role;
use crate::error::AppError;
use crate::models::{Credential, NewUser, User, UserChanges};

const USER_COLUMNS: &str =
    "id, name, email, role, deleted, deleted_at, deleted_by, created_at, updated_at";

pub async fn insert_user(db: &SqlitePool, new: NewUser) -> Result<User, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO users
            (id, name, email, password_hash, role, deleted, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
        "#,
    )
    .bind(&id)
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(new.role)
    .bind(&now)
    .execute(db)
    .await
    .map_err(|e| {
        if AppError::is_unique_violation(&e) {
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    Ok(User {
        id,
        name: new.name,
        email: new.email,
        role: new.role,
        deleted: false,
        deleted_at: None,
        deleted_by: None,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn find_user(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted = 0");
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn find_user_any_state(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Live account with its password hash, for login.
pub async fn find_credential_by_email(
    db: &SqlitePool,
    email: &str,
) -> Result<Option<Credential>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ? AND deleted = 0");
    sqlx::query_as::<_, Credential>(&sql)
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn email_taken(db: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ? AND deleted = 0")
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(row.is_some())
}

pub async fn fetch_users(db: &SqlitePool, role: Option<Role>) -> Result<Vec<User>, sqlx::Error> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE deleted = 0 AND (?1 IS NULL OR role = ?1) ORDER BY created_at DESC"
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(role)
        .fetch_all(db)
        .await
}

pub async fn update_user(
    db: &SqlitePool,
    id: &str,
    changes: UserChanges,
) -> Result<Option<User>, AppError> {
    let mut current = match find_user(db, id).await? {
        Some(u) => u,
        None => return Ok(None),
    };

    if let Some(name) = changes.name {
        current.name = name;
    }
    if let Some(email) = changes.email {
        current.email = email;
    }
    if let Some(role) = changes.role {
        current.role = role;
    }
    current.updated_at = now();

    let stored = store_user(db, &current, changes.password_hash.as_deref())
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e) {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

    Ok(stored.then_some(current))
}

/// Writes the editable fields back, and the hash when given. False when the
/// row was deleted meanwhile.
async fn store_user(db: &SqlitePool, user: &User, password_hash: Option<&str>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET name = ?1,
            email = ?2,
            role = ?3,
            password_hash = COALESCE(?4, password_hash),
            updated_at = ?5
        WHERE id = ?6 AND deleted = 0
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role)
    .bind(password_hash)
    .bind(&user.updated_at)
    .bind(&user.id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn soft_delete_user(
    db: &SqlitePool,
    id: &str,
    actor_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    if !mark_deleted(db, Table::Users, id, actor_id).await? {
        return Ok(None);
    }
    find_user_any_state(db, id).await
}
