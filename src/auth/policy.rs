//! Role-based access policy.
//!
//! Every route names the [`Operation`] it performs; the operation's [`Tier`]
//! decides which roles may run it. Decisions are pure and never touch storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Claims;
use crate::error::AppError;

/// Canonical role set. Stored and serialized upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Instructor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Instructor => "INSTRUCTOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Roles a visitor may pick for themselves at registration.
    pub fn is_self_registrable(&self) -> bool {
        matches!(self, Role::Student | Role::Instructor)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Instructor | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = AppError;

    /// Case-insensitive; also accepts the legacy Indonesian role names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STUDENT" | "PESERTA" => Ok(Role::Student),
            "INSTRUCTOR" | "PENGAJAR" => Ok(Role::Instructor),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(AppError::InvalidRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Privilege tier an operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Any authenticated caller.
    Public,
    /// INSTRUCTOR or ADMIN.
    Elevated,
    AdminOnly,
    /// The caller must be the record's own subject, and hold one of these roles.
    SelfOnly(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ScheduleRead,
    ScheduleCreate,
    ScheduleUpdate,
    ScheduleDelete,
    AttendanceSubmit,
    AttendanceReadOwn,
    AttendanceReadAll,
    AttendanceDelete,
    MaterialRead,
    MaterialCreate,
    MaterialUpdate,
    MaterialDelete,
    UserRead,
    UserCreate,
    UserUpdate,
    UserDelete,
    UserReadSelf,
    UserReadProfile,
}

impl Operation {
    pub const fn tier(self) -> Tier {
        match self {
            Operation::ScheduleRead | Operation::MaterialRead | Operation::UserReadProfile => Tier::Public,
            Operation::ScheduleCreate
            | Operation::ScheduleUpdate
            | Operation::ScheduleDelete
            | Operation::AttendanceReadAll
            | Operation::AttendanceDelete => Tier::Elevated,
            // Instructors see a "new material" button in the dashboard, but
            // material authoring stays with administrators server-side.
            Operation::MaterialCreate
            | Operation::MaterialUpdate
            | Operation::MaterialDelete
            | Operation::UserRead
            | Operation::UserCreate
            | Operation::UserUpdate
            | Operation::UserDelete => Tier::AdminOnly,
            Operation::AttendanceSubmit => Tier::SelfOnly(&[Role::Student]),
            Operation::AttendanceReadOwn | Operation::UserReadSelf => Tier::SelfOnly(&Role::ALL),
        }
    }
}

/// Pure role check for `op`. Subject ownership is checked by [`authorize_subject`].
pub fn can_perform(role: Role, op: Operation) -> bool {
    match op.tier() {
        Tier::Public => true,
        Tier::Elevated => role.is_staff(),
        Tier::AdminOnly => role == Role::Admin,
        Tier::SelfOnly(roles) => roles.contains(&role),
    }
}

pub fn authorize(claims: &Claims, op: Operation) -> Result<(), AppError> {
    if can_perform(claims.role, op) {
        Ok(())
    } else {
        tracing::debug!(user_id = %claims.sub, role = %claims.role, ?op, "access denied");
        Err(AppError::Forbidden)
    }
}

/// Like [`authorize`], but also requires the caller to be `subject_id`.
pub fn authorize_subject(claims: &Claims, op: Operation, subject_id: &str) -> Result<(), AppError> {
    authorize(claims, op)?;
    if claims.sub == subject_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> Claims {
        Claims {
            sub: "u-1".to_string(),
            email: "u@test.com".to_string(),
            role,
            name: None,
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_policy_table() {
        use Operation::*;
        // (operation, student, instructor, admin)
        let table = [
            (ScheduleCreate, false, true, true),
            (ScheduleUpdate, false, true, true),
            (ScheduleDelete, false, true, true),
            (ScheduleRead, true, true, true),
            (AttendanceSubmit, true, false, false),
            (AttendanceReadOwn, true, true, true),
            (AttendanceReadAll, false, true, true),
            (AttendanceDelete, false, true, true),
            (MaterialCreate, false, false, true),
            (MaterialUpdate, false, false, true),
            (MaterialDelete, false, false, true),
            (MaterialRead, true, true, true),
            (UserRead, false, false, true),
            (UserCreate, false, false, true),
            (UserUpdate, false, false, true),
            (UserDelete, false, false, true),
            (UserReadSelf, true, true, true),
            (UserReadProfile, true, true, true),
        ];

        for (op, student, instructor, admin) in table {
            assert_eq!(can_perform(Role::Student, op), student, "student {:?}", op);
            assert_eq!(can_perform(Role::Instructor, op), instructor, "instructor {:?}", op);
            assert_eq!(can_perform(Role::Admin, op), admin, "admin {:?}", op);
        }
    }

    #[test]
    fn test_authorize_returns_forbidden() {
        let err = authorize(&claims(Role::Student), Operation::ScheduleCreate).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert!(authorize(&claims(Role::Instructor), Operation::ScheduleCreate).is_ok());
    }

    #[test]
    fn test_authorize_subject() {
        let c = claims(Role::Student);
        assert!(authorize_subject(&c, Operation::UserReadSelf, "u-1").is_ok());
        assert!(matches!(
            authorize_subject(&c, Operation::UserReadSelf, "u-2"),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_role_parsing_normalizes_case_and_legacy_names() {
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("PESERTA".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("pengajar".parse::<Role>().unwrap(), Role::Instructor);
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!(matches!("root".parse::<Role>(), Err(AppError::InvalidRole(_))));
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Instructor).unwrap(), "\"INSTRUCTOR\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"janitor\"").is_err());
    }
}
