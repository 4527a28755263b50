//! Student model and roster requests

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// A student on a teacher's roster, as persisted in the `students` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Unique within the owning teacher's roster
    pub roll_number: String,
    /// Class/section label (e.g. "5-B")
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "teacherID")]
    pub teacher_id: String,
    /// Today's status as last recorded (denormalized from attendance)
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub absent_reason: String,
    /// Month-to-date percentage as of the last attendance write
    #[serde(default)]
    pub attendance_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Create student request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "Roll number is required"))]
    pub roll_number: String,
    #[serde(rename = "class")]
    #[validate(length(min = 1, max = 40, message = "Class is required"))]
    pub class_name: String,
    #[validate(length(min = 5, max = 20, message = "Phone must be 5-20 characters"))]
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub address: Option<String>,
}

/// Update student request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudent {
    #[validate(length(min = 1, max = 120, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Roll number cannot be empty"))]
    pub roll_number: Option<String>,
    #[serde(rename = "class")]
    #[validate(length(min = 1, max = 40, message = "Class cannot be empty"))]
    pub class_name: Option<String>,
    #[validate(length(min = 5, max = 20, message = "Phone must be 5-20 characters"))]
    pub phone: Option<String>,
    pub guardian_name: Option<String>,
    pub address: Option<String>,
}

impl UpdateStudent {
    pub fn apply_to(&self, student: &mut Student) {
        if let Some(ref name) = self.name {
            student.name = name.trim().to_string();
        }
        if let Some(ref roll) = self.roll_number {
            student.roll_number = roll.trim().to_string();
        }
        if let Some(ref class_name) = self.class_name {
            student.class_name = class_name.trim().to_string();
        }
        if self.phone.is_some() {
            student.phone = self.phone.clone();
        }
        if self.guardian_name.is_some() {
            student.guardian_name = self.guardian_name.clone();
        }
        if self.address.is_some() {
            student.address = self.address.clone();
        }
    }
}

/// Roster query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RosterQuery {
    /// Roster owner; defaults to the calling teacher
    pub teacher_id: Option<String>,
}

/// Roll numbers compare numerically when both parse, textually otherwise
pub fn roll_order(a: &Student, b: &Student) -> std::cmp::Ordering {
    match (a.roll_number.parse::<u64>(), b.roll_number.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.roll_number.cmp(&b.roll_number),
    }
}
