//! Attendance records and the per-day roster view
//!
//! Status changes are pure transitions: `(view, event) -> new view`. Services
//! persist the outcome only after a transition succeeds, so a rejected event
//! never leaves a half-applied view behind.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult, Operation},
    models::student::Student,
};

/// `absentReason` value stored on present records
pub const PRESENT_MARKER: &str = "present";

// ---------------------------------------------------------------------------
// AttendanceRecord
// ---------------------------------------------------------------------------

/// One student's status on one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    /// Student id
    pub sid: String,
    /// Calendar date (YYYY-MM-DD)
    #[schema(value_type = String, example = "2024-03-04")]
    pub current_date: NaiveDate,
    pub present: bool,
    /// Reason when absent, `"present"` otherwise
    pub absent_reason: String,
    pub name: String,
    pub roll_number: String,
    #[serde(rename = "class")]
    pub class_name: String,
}

impl AttendanceRecord {
    /// Deterministic key for the (student, date) pair
    pub fn composite_id(student_id: &str, date: NaiveDate) -> String {
        format!("{}_{}", student_id, crate::dates::format_iso_date(date))
    }

    /// Build the record for a decided status; `Unset` has no record
    pub fn for_status(student: &Student, date: NaiveDate, status: &AttendanceStatus) -> Option<Self> {
        let (present, absent_reason) = match status {
            AttendanceStatus::Unset => return None,
            AttendanceStatus::Present => (true, PRESENT_MARKER.to_string()),
            AttendanceStatus::Absent { reason } => (false, reason.clone()),
        };
        Some(Self {
            id: Self::composite_id(&student.id, date),
            sid: student.id.clone(),
            current_date: date,
            present,
            absent_reason,
            name: student.name.clone(),
            roll_number: student.roll_number.clone(),
            class_name: student.class_name.clone(),
        })
    }

    pub fn status(&self) -> AttendanceStatus {
        if self.present {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Absent {
                reason: self.absent_reason.clone(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Per (student, date) attendance state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// No record exists for the date
    Unset,
    Present,
    Absent { reason: String },
}

/// A teacher action on one student for the view's date
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceEvent {
    MarkPresent { student_id: String },
    MarkAbsent { student_id: String, reason: String },
}

impl AttendanceEvent {
    pub fn student_id(&self) -> &str {
        match self {
            AttendanceEvent::MarkPresent { student_id }
            | AttendanceEvent::MarkAbsent { student_id, .. } => student_id,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            AttendanceEvent::MarkPresent { .. } => Operation::SetPresent,
            AttendanceEvent::MarkAbsent { .. } => Operation::SetAbsent,
        }
    }

    /// Absence needs a non-blank reason
    pub fn validate(&self) -> AppResult<()> {
        match self {
            AttendanceEvent::MarkAbsent { reason, .. } if reason.trim().is_empty() => Err(
                AppError::Validation("An absence reason is required".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

impl AttendanceStatus {
    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceStatus::Present)
    }

    /// Next state after `event`. Presence clears any reason.
    pub fn after(&self, event: &AttendanceEvent) -> AppResult<AttendanceStatus> {
        event.validate()?;
        match event {
            AttendanceEvent::MarkPresent { .. } => Ok(AttendanceStatus::Present),
            AttendanceEvent::MarkAbsent { reason, .. } => Ok(AttendanceStatus::Absent {
                reason: reason.trim().to_string(),
            }),
        }
    }
}

/// Whether attendance may be taken on a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayKind {
    Working,
    Sunday,
    Holiday { name: String },
}

impl DayKind {
    pub fn is_working(&self) -> bool {
        matches!(self, DayKind::Working)
    }

    pub fn require_working(&self, date: NaiveDate) -> AppResult<()> {
        match self {
            DayKind::Working => Ok(()),
            DayKind::Sunday => Err(AppError::AttendanceClosed(format!(
                "{} is a Sunday",
                date
            ))),
            DayKind::Holiday { name } => Err(AppError::AttendanceClosed(format!(
                "{} is a holiday ({})",
                date, name
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student: Student,
    #[schema(value_type = Object)]
    pub status: AttendanceStatus,
}

/// A teacher's roster annotated with one day's attendance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterView {
    #[schema(value_type = String, example = "2024-03-04")]
    pub date: NaiveDate,
    #[schema(value_type = Object)]
    pub day: DayKind,
    pub entries: Vec<RosterEntry>,
}

impl RosterView {
    pub fn entry(&self, student_id: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.student.id == student_id)
    }

    pub fn status_of(&self, student_id: &str) -> Option<&AttendanceStatus> {
        self.entry(student_id).map(|e| &e.status)
    }

    /// Apply a teacher action, returning the new view; `self` is untouched
    pub fn apply(&self, event: &AttendanceEvent) -> AppResult<RosterView> {
        self.day.require_working(self.date)?;

        let entry = self.entry(event.student_id()).ok_or_else(|| {
            AppError::NotFound(format!(
                "Student {} is not on this roster",
                event.student_id()
            ))
        })?;
        let next = entry.status.after(event)?;

        Ok(self.with_status(event.student_id(), next))
    }

    /// Copy of the view with one student's status replaced
    pub fn with_status(&self, student_id: &str, status: AttendanceStatus) -> RosterView {
        let mut next = self.clone();
        if let Some(entry) = next.entries.iter_mut().find(|e| e.student.id == student_id) {
            entry.status = status;
        }
        next
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_present()).count()
    }

    pub fn absent_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, AttendanceStatus::Absent { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Results and requests
// ---------------------------------------------------------------------------

/// A write that the store rejected for one student
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutationFailure {
    pub student_id: String,
    #[schema(value_type = String)]
    pub operation: Operation,
    pub message: String,
    pub retryable: bool,
}

impl MutationFailure {
    pub fn from_error(student_id: &str, operation: Operation, error: &AppError) -> Self {
        Self {
            student_id: student_id.to_string(),
            operation,
            message: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Result of initializing a day's attendance
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefaultOutcome {
    pub view: RosterView,
    /// Students that received a default present record in this call
    pub created: Vec<String>,
    pub failures: Vec<MutationFailure>,
    /// The caller abandoned the view before every write was issued
    pub cancelled: bool,
}

/// One student's month, for the summary report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    pub name: String,
    pub roll_number: String,
    pub present_days: u32,
    pub working_days: u32,
    /// 0-100, two decimals; 0 when the month has no working days
    pub percentage: f64,
}

/// Mark-absent request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AbsentRequest {
    pub reason: String,
}

/// Roster view query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RosterDateQuery {
    /// Day to show (YYYY-MM-DD); defaults to today
    pub date: Option<String>,
    /// Roster owner; defaults to the calling teacher
    pub teacher_id: Option<String>,
}

/// Monthly query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Month (YYYY-MM); defaults to the current month
    pub month: Option<String>,
    /// Roster owner; defaults to the calling teacher
    pub teacher_id: Option<String>,
}
