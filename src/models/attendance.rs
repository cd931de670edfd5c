use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    Present,
    Excused,
    Sick,
}

impl FromStr for AttendanceStatus {
    type Err = AppError;

    /// Accepts the English names and the dashboard's HADIR/IZIN/SAKIT.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PRESENT" | "HADIR" => Ok(AttendanceStatus::Present),
            "EXCUSED" | "IZIN" => Ok(AttendanceStatus::Excused),
            "SICK" | "SAKIT" => Ok(AttendanceStatus::Sick),
            _ => Err(AppError::Validation(format!("Invalid status: {}", s))),
        }
    }
}

impl TryFrom<String> for AttendanceStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: String,
    pub user_id: String,
    pub schedule_id: String,
    pub status: AttendanceStatus,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub schedule_title: Option<String>,
    pub created_by: String,
    pub updated_by: String,
    pub deleted: bool,
    pub deleted_at: Option<String>,
    pub deleted_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitAttendanceRequest {
    pub status: Option<String>,
}

impl SubmitAttendanceRequest {
    pub fn validate(self) -> Result<AttendanceStatus, AppError> {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(status) => status.parse(),
            None => Err(AppError::Validation("Missing required fields: status".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    #[serde(alias = "jadwalId")]
    pub schedule_id: Option<String>,
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accepts_legacy_names() {
        assert_eq!("hadir".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Present);
        assert_eq!("IZIN".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Excused);
        assert_eq!("Sakit".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Sick);
        assert_eq!("present".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Present);
        assert!("LATE".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn test_submit_requires_status() {
        let req = SubmitAttendanceRequest { status: None };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let req = SubmitAttendanceRequest { status: Some("SICK".to_string()) };
        assert_eq!(req.validate().unwrap(), AttendanceStatus::Sick);
    }

    #[test]
    fn test_status_serializes_canonically() {
        assert_eq!(serde_json::to_string(&AttendanceStatus::Excused).unwrap(), "\"EXCUSED\"");
    }
}
