//! Data models for Rollcall

pub mod attendance;
pub mod holiday;
pub mod session;
pub mod student;

// Re-export commonly used types
pub use attendance::{AttendanceRecord, AttendanceStatus, DayKind, RosterView};
pub use holiday::Holiday;
pub use session::{Role, Session};
pub use student::Student;
