use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::attendance::AttendanceStatus;
use super::validation::{MissingFields, ensure_not_past, format_timestamp, parse_date, provided};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub created_by: String,
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,
    pub deleted: bool,
    pub deleted_at: Option<String>,
    pub deleted_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A schedule as one student sees it, with their own submission if any.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MySchedule {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub schedule: Schedule,
    pub already_attended: bool,
    pub attendance_status: Option<AttendanceStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewScheduleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "tanggal")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScheduleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "tanggal")]
    pub date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub title: String,
    pub description: String,
    pub date: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl NewScheduleRequest {
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewSchedule, AppError> {
        let mut missing = MissingFields::default();
        let title = missing.take("title", self.title);
        let description = missing.take("description", self.description);
        let date = missing.take("date", self.date);
        missing.check()?;

        let date = parse_date(&date)?;
        ensure_not_past(date, now)?;

        Ok(NewSchedule {
            title,
            description,
            date: format_timestamp(date),
        })
    }
}

impl UpdateScheduleRequest {
    pub fn validate(self, now: DateTime<Utc>) -> Result<ScheduleChanges, AppError> {
        let date = match provided(self.date) {
            Some(raw) => {
                let date = parse_date(&raw)?;
                ensure_not_past(date, now)?;
                Some(format_timestamp(date))
            }
            None => None,
        };

        let changes = ScheduleChanges {
            title: provided(self.title),
            description: provided(self.description),
            date,
        };

        if changes.title.is_none() && changes.description.is_none() && changes.date.is_none() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        Ok(changes)
    }
}
