use sqlx::SqlitePool;
use uuid::Uuid;

use super::{Table, mark_deleted, now};
use crate::error::AppError;
use crate::models::{Attendance, AttendanceQuery, AttendanceStatus};

macro_rules! select_attendance {
    () => {
        r#"
        SELECT
            a.id, a.user_id, a.schedule_id, a.status,
            u.name AS student_name,
            u.email AS student_email,
            s.title AS schedule_title,
            a.created_by, a.updated_by,
            a.deleted, a.deleted_at, a.deleted_by, a.created_at, a.updated_at
        FROM attendance a
        LEFT JOIN users u ON u.id = a.user_id
        LEFT JOIN schedules s ON s.id = a.schedule_id
        "#
    };
}

/// Records `user_id`'s status for a live schedule.
///
/// One statement inserts only while the schedule is live; the partial unique
/// index rejects a second live submission for the same pair, including one
/// racing on another connection.
pub async fn submit_attendance(
    db: &SqlitePool,
    user_id: &str,
    schedule_id: &str,
    status: AttendanceStatus,
) -> Result<Attendance, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = now();

    let inserted = sqlx::query(
        r#"
        INSERT INTO attendance
            (id, user_id, schedule_id, status, created_by, updated_by,
            deleted, created_at, updated_at)
        SELECT ?1, ?2, ?3, ?4, ?2, ?2, 0, ?5, ?5
        WHERE EXISTS (SELECT 1 FROM schedules WHERE id = ?3 AND deleted = 0)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(schedule_id)
    .bind(status)
    .bind(&now)
    .execute(db)
    .await
    .map_err(|e| {
        if AppError::is_unique_violation(&e) {
            duplicate()
        } else {
            AppError::Database(e)
        }
    })?
    .rows_affected();

    if inserted == 0 {
        return Err(AppError::NotFound);
    }

    find_attendance(db, &id)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))
}

fn duplicate() -> AppError {
    AppError::Conflict("Attendance already submitted for this schedule".to_string())
}

pub async fn find_attendance(db: &SqlitePool, id: &str) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(concat!(select_attendance!(), "WHERE a.id = ?1 AND a.deleted = 0"))
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn find_attendance_any_state(db: &SqlitePool, id: &str) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(concat!(select_attendance!(), "WHERE a.id = ?1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_attendance(
    db: &SqlitePool,
    filter: &AttendanceQuery,
) -> Result<Vec<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(concat!(
        select_attendance!(),
        r#"
        WHERE a.deleted = 0
            AND (?1 IS NULL OR a.schedule_id = ?1)
            AND (?2 IS NULL OR a.user_id = ?2)
        ORDER BY a.created_at DESC
        "#
    ))
    .bind(filter.schedule_id.as_deref())
    .bind(filter.user_id.as_deref())
    .fetch_all(db)
    .await
}

pub async fn soft_delete_attendance(
    db: &SqlitePool,
    id: &str,
    actor_id: &str,
) -> Result<Option<Attendance>, sqlx::Error> {
    if !mark_deleted(db, Table::Attendance, id, actor_id).await? {
        return Ok(None);
    }
    find_attendance_any_state(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::schedules::{insert_schedule, soft_delete_schedule};
    use crate::db::test_support::{seed_user, setup_test_db};
    use crate::models::NewSchedule;

    async fn seed_schedule(pool: &SqlitePool, owner: &str) -> String {
        insert_schedule(
            pool,
            NewSchedule {
                title: "Session 1".to_string(),
                description: "intro".to_string(),
                date: "2099-01-01T00:00:00.000Z".to_string(),
            },
            owner,
        )
        .await
        .expect("Failed to insert schedule")
        .id
    }

    #[tokio::test]
    async fn test_submit_attendance() {
        let pool = setup_test_db().await;
        let teacher = seed_user(&pool, "teach@test.com", Role::Instructor).await;
        let student = seed_user(&pool, "alice@test.com", Role::Student).await;
        let schedule_id = seed_schedule(&pool, &teacher.id).await;

        let record = submit_attendance(&pool, &student.id, &schedule_id, AttendanceStatus::Present)
            .await
            .expect("Failed to submit");

        assert_eq!(record.user_id, student.id);
        assert_eq!(record.schedule_id, schedule_id);
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.created_by, student.id);
        assert_eq!(record.updated_by, student.id);
        assert_eq!(record.schedule_title.as_deref(), Some("Session 1"));
        assert_eq!(record.student_email.as_deref(), Some("alice@test.com"));
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_conflict() {
        let pool = setup_test_db().await;
        let teacher = seed_user(&pool, "teach@test.com", Role::Instructor).await;
        let student = seed_user(&pool, "alice@test.com", Role::Student).await;
        let schedule_id = seed_schedule(&pool, &teacher.id).await;

        submit_attendance(&pool, &student.id, &schedule_id, AttendanceStatus::Present)
            .await
            .unwrap();
        let err = submit_attendance(&pool, &student.id, &schedule_id, AttendanceStatus::Sick)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let filter = AttendanceQuery {
            schedule_id: Some(schedule_id.clone()),
            user_id: Some(student.id.clone()),
        };
        let records = fetch_attendance(&pool, &filter).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttendanceStatus::Present);
    }

    #[tokio::test]
    async fn test_resubmit_after_void() {
        let pool = setup_test_db().await;
        let teacher = seed_user(&pool, "teach@test.com", Role::Instructor).await;
        let student = seed_user(&pool, "alice@test.com", Role::Student).await;
        let schedule_id = seed_schedule(&pool, &teacher.id).await;

        let first = submit_attendance(&pool, &student.id, &schedule_id, AttendanceStatus::Present)
            .await
            .unwrap();
        let voided = soft_delete_attendance(&pool, &first.id, &teacher.id)
            .await
            .unwrap()
            .expect("record not found");
        assert!(voided.deleted);
        assert_eq!(voided.deleted_by.as_deref(), Some(teacher.id.as_str()));
        assert!(find_attendance(&pool, &first.id).await.unwrap().is_none());

        let second = submit_attendance(&pool, &student.id, &schedule_id, AttendanceStatus::Excused)
            .await
            .expect("resubmission after void should succeed");
        assert_ne!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_unknown_or_deleted_schedule_is_not_found() {
        let pool = setup_test_db().await;
        let teacher = seed_user(&pool, "teach@test.com", Role::Instructor).await;
        let student = seed_user(&pool, "alice@test.com", Role::Student).await;

        let err = submit_attendance(&pool, &student.id, "missing", AttendanceStatus::Present)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        let schedule_id = seed_schedule(&pool, &teacher.id).await;
        soft_delete_schedule(&pool, &schedule_id, &teacher.id).await.unwrap();
        let err = submit_attendance(&pool, &student.id, &schedule_id, AttendanceStatus::Present)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_fetch_attendance_filters() {
        let pool = setup_test_db().await;
        let teacher = seed_user(&pool, "teach@test.com", Role::Instructor).await;
        let alice = seed_user(&pool, "alice@test.com", Role::Student).await;
        let bob = seed_user(&pool, "bob@test.com", Role::Student).await;
        let s1 = seed_schedule(&pool, &teacher.id).await;
        let s2 = seed_schedule(&pool, &teacher.id).await;

        submit_attendance(&pool, &alice.id, &s1, AttendanceStatus::Present).await.unwrap();
        submit_attendance(&pool, &alice.id, &s2, AttendanceStatus::Sick).await.unwrap();
        submit_attendance(&pool, &bob.id, &s1, AttendanceStatus::Excused).await.unwrap();

        assert_eq!(fetch_attendance(&pool, &AttendanceQuery::default()).await.unwrap().len(), 3);

        let by_schedule = AttendanceQuery {
            schedule_id: Some(s1.clone()),
            user_id: None,
        };
        assert_eq!(fetch_attendance(&pool, &by_schedule).await.unwrap().len(), 2);

        let by_user = AttendanceQuery {
            schedule_id: None,
            user_id: Some(alice.id.clone()),
        };
        assert_eq!(fetch_attendance(&pool, &by_user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_my_schedules_flags_own_submission() {
        let pool = setup_test_db().await;
        let teacher = seed_user(&pool, "teach@test.com", Role::Instructor).await;
        let alice = seed_user(&pool, "alice@test.com", Role::Student).await;
        let bob = seed_user(&pool, "bob@test.com", Role::Student).await;
        let s1 = seed_schedule(&pool, &teacher.id).await;

        submit_attendance(&pool, &bob.id, &s1, AttendanceStatus::Sick).await.unwrap();

        let mine = crate::db::schedules::fetch_schedules_for_user(&pool, &alice.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(!mine[0].already_attended);
        assert_eq!(mine[0].attendance_status, None);

        let theirs = crate::db::schedules::fetch_schedules_for_user(&pool, &bob.id).await.unwrap();
        assert!(theirs[0].already_attended);
        assert_eq!(theirs[0].attendance_status, Some(AttendanceStatus::Sick));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_yield_one_record() {
        let path = std::env::temp_dir().join(format!("absensi-{}.db", Uuid::new_v4()));
        let pool = crate::db::connect(&format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .expect("Failed to open file db");
        let teacher = seed_user(&pool, "teach@test.com", Role::Instructor).await;
        let student = seed_user(&pool, "alice@test.com", Role::Student).await;

        for _ in 0..5 {
            let schedule_id = seed_schedule(&pool, &teacher.id).await;
            let handles: Vec<_> = (0..6)
                .map(|_| {
                    let pool = pool.clone();
                    let user_id = student.id.clone();
                    let schedule_id = schedule_id.clone();
                    tokio::spawn(async move {
                        submit_attendance(&pool, &user_id, &schedule_id, AttendanceStatus::Present).await
                    })
                })
                .collect();

            let mut created = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => created += 1,
                    Err(AppError::Conflict(_)) => {}
                    Err(other) => panic!("unexpected error: {:?}", other),
                }
            }
            assert_eq!(created, 1);
        }

        pool.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
