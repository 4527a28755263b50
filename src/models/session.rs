//! Caller session passed explicitly into every service operation

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// School staff roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    HeadTeacher,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::HeadTeacher => "head_teacher",
            Role::Teacher => "teacher",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "admin" => Ok(Role::Admin),
            "head_teacher" | "headteacher" => Ok(Role::HeadTeacher),
            "teacher" => Ok(Role::Teacher),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Who is acting, in which role, for which school
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub school_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role, school_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            school_id: school_id.into(),
        }
    }

    pub fn is_staff_manager(&self) -> bool {
        matches!(self.role, Role::Admin | Role::HeadTeacher)
    }

    /// Only the teacher owning a roster may change it
    pub fn require_roster_owner(&self, teacher_id: &str) -> Result<(), AppError> {
        if self.role == Role::Teacher && self.user_id == teacher_id {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Only the owning teacher may modify roster {}",
                teacher_id
            )))
        }
    }

    /// Owners read their roster; admins and head-teachers read any
    pub fn require_roster_reader(&self, teacher_id: &str) -> Result<(), AppError> {
        if self.is_staff_manager() || self.user_id == teacher_id {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Insufficient rights to read roster {}",
                teacher_id
            )))
        }
    }

    pub fn require_holiday_manager(&self) -> Result<(), AppError> {
        if self.is_staff_manager() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator or head-teacher privileges required".to_string(),
            ))
        }
    }
}
