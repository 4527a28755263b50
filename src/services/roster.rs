//! Roster (students) service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        session::Session,
        student::{CreateStudent, Student, UpdateStudent},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RosterService {
    repository: Repository,
}

impl RosterService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Students of `teacher_id`, or of the caller when omitted
    pub async fn list(&self, session: &Session, teacher_id: Option<&str>) -> AppResult<Vec<Student>> {
        let teacher_id = teacher_id.unwrap_or(&session.user_id);
        session.require_roster_reader(teacher_id)?;
        self.repository.students.list_by_teacher(teacher_id).await
    }

    pub async fn get(&self, session: &Session, id: &str) -> AppResult<Student> {
        let student = self.repository.students.get_required(id).await?;
        session.require_roster_reader(&student.teacher_id)?;
        Ok(student)
    }

    /// Add a student to the caller's roster
    pub async fn create(&self, session: &Session, data: &CreateStudent) -> AppResult<Student> {
        data.validate()?;
        let name = required(&data.name, "Name")?;
        let roll_number = required(&data.roll_number, "Roll number")?;
        let class_name = required(&data.class_name, "Class")?;
        session.require_roster_owner(&session.user_id)?;

        self.ensure_roll_free(&session.user_id, &roll_number, None).await?;

        let student = Student {
            id: Uuid::new_v4().to_string(),
            name,
            roll_number,
            class_name,
            teacher_id: session.user_id.clone(),
            present: false,
            absent_reason: String::new(),
            attendance_percentage: 0.0,
            phone: data.phone.clone(),
            guardian_name: data.guardian_name.clone(),
            address: data.address.clone(),
        };
        self.repository.students.save(&student).await?;

        tracing::info!(
            school = %session.school_id,
            teacher = %student.teacher_id,
            student = %student.id,
            "Student added to roster"
        );
        Ok(student)
    }

    pub async fn update(&self, session: &Session, id: &str, data: &UpdateStudent) -> AppResult<Student> {
        data.validate()?;
        for (value, label) in [
            (&data.name, "Name"),
            (&data.roll_number, "Roll number"),
            (&data.class_name, "Class"),
        ] {
            if let Some(v) = value {
                required(v, label)?;
            }
        }

        let mut student = self.repository.students.get_required(id).await?;
        session.require_roster_owner(&student.teacher_id)?;

        if let Some(ref roll) = data.roll_number {
            self.ensure_roll_free(&student.teacher_id, roll.trim(), Some(id)).await?;
        }

        data.apply_to(&mut student);
        self.repository.students.save(&student).await?;
        Ok(student)
    }

    /// Remove a student from the roster. Attendance records are kept.
    pub async fn delete(&self, session: &Session, id: &str) -> AppResult<()> {
        let student = self.repository.students.get_required(id).await?;
        session.require_roster_owner(&student.teacher_id)?;
        self.repository.students.delete(id).await?;
        tracing::info!(teacher = %student.teacher_id, student = id, "Student removed from roster");
        Ok(())
    }

    async fn ensure_roll_free(&self, teacher_id: &str, roll_number: &str, except: Option<&str>) -> AppResult<()> {
        let taken = self
            .repository
            .students
            .find_by_roll(teacher_id, roll_number)
            .await?
            .into_iter()
            .any(|s| Some(s.id.as_str()) != except);
        if taken {
            return Err(AppError::Validation(format!(
                "Roll number {} already exists on this roster",
                roll_number
            )));
        }
        Ok(())
    }
}

fn required(value: &str, label: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", label)));
    }
    Ok(trimmed.to_string())
}
