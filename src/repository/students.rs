//! Students collection

use std::sync::Arc;

use serde_json::{json, Value};

use super::{from_document, to_document, DocumentStore, STUDENTS};
use crate::{
    error::{AppError, AppResult},
    models::student::{roll_order, Student},
};

#[derive(Clone)]
pub struct StudentsRepository {
    store: Arc<dyn DocumentStore>,
}

impl StudentsRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Student>> {
        self.store
            .get(STUDENTS, id)
            .await?
            .map(from_document)
            .transpose()
    }

    /// Get a student by ID, `NotFound` if missing
    pub async fn get_required(&self, id: &str) -> AppResult<Student> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
    }

    /// A teacher's roster, ordered by roll number
    pub async fn list_by_teacher(&self, teacher_id: &str) -> AppResult<Vec<Student>> {
        let mut students = self
            .store
            .query_by_field(STUDENTS, "teacherID", &Value::from(teacher_id))
            .await?
            .into_iter()
            .map(from_document)
            .collect::<AppResult<Vec<Student>>>()?;
        students.sort_by(roll_order);
        Ok(students)
    }

    pub async fn find_by_roll(&self, teacher_id: &str, roll_number: &str) -> AppResult<Vec<Student>> {
        self.store
            .query_by_two_fields(
                STUDENTS,
                "teacherID",
                &Value::from(teacher_id),
                "rollNumber",
                &Value::from(roll_number),
            )
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn save(&self, student: &Student) -> AppResult<()> {
        self.store
            .upsert(STUDENTS, &student.id, to_document(student)?)
            .await
    }

    /// Refresh the denormalized "today" fields and month percentage after an
    /// attendance write
    pub async fn set_today_status(
        &self,
        id: &str,
        present: bool,
        absent_reason: &str,
        attendance_percentage: f64,
    ) -> AppResult<()> {
        let partial = json!({
            "present": present,
            "absentReason": absent_reason,
            "attendancePercentage": attendance_percentage,
        });
        self.store
            .update(STUDENTS, id, to_document(&partial)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.store.delete(STUDENTS, id).await
    }
}
