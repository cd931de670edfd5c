use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::validation::{MissingFields, provided};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Ok(Priority::High),
            "MEDIUM" => Ok(Priority::Medium),
            "LOW" => Ok(Priority::Low),
            _ => Err(AppError::Validation(format!("Invalid priority: {}", s))),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub subject: String,
    pub priority: Priority,
    pub instructor_id: String,
    pub instructor_name: Option<String>,
    pub instructor_email: Option<String>,
    pub deleted: bool,
    pub deleted_at: Option<String>,
    pub deleted_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Create and update bodies share this shape; the dashboard sends the
/// Indonesian field names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterialRequest {
    #[serde(alias = "judul")]
    pub title: Option<String>,
    #[serde(alias = "deskripsi")]
    pub description: Option<String>,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub title: String,
    pub description: String,
    pub category: String,
    pub subject: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub priority: Option<Priority>,
}

impl MaterialRequest {
    pub fn validate_new(self) -> Result<NewMaterial, AppError> {
        let mut missing = MissingFields::default();
        let title = missing.take("judul", self.title);
        let description = missing.take("deskripsi", self.description);
        let category = missing.take("category", self.category);
        let subject = missing.take("subject", self.subject);
        let priority = missing.take("priority", self.priority);
        missing.check()?;

        Ok(NewMaterial {
            title,
            description,
            category,
            subject,
            priority: priority.parse()?,
        })
    }

    pub fn validate_changes(self) -> Result<MaterialChanges, AppError> {
        let changes = MaterialChanges {
            title: provided(self.title),
            description: provided(self.description),
            category: provided(self.category),
            subject: provided(self.subject),
            priority: provided(self.priority).map(|p| p.parse()).transpose()?,
        };

        if changes.title.is_none()
            && changes.description.is_none()
            && changes.category.is_none()
            && changes.subject.is_none()
            && changes.priority.is_none()
        {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        Ok(changes)
    }
}
