//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;

use rollcall_server::{
    models::{holiday::Holiday, session::Role, Session, Student},
    repository::{DocumentStore, MemoryStore, Repository},
    services::{FixedClock, Services},
};

pub const TEACHER: &str = "T1";
pub const OTHER_TEACHER: &str = "T2";
pub const SCHOOL: &str = "SCH-1";

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn teacher() -> Session {
    Session::new(TEACHER, Role::Teacher, SCHOOL)
}

pub fn other_teacher() -> Session {
    Session::new(OTHER_TEACHER, Role::Teacher, SCHOOL)
}

pub fn head_teacher() -> Session {
    Session::new("H1", Role::HeadTeacher, SCHOOL)
}

pub fn student(id: &str, roll: &str) -> Student {
    Student {
        id: id.to_string(),
        name: format!("Student {}", id),
        roll_number: roll.to_string(),
        class_name: "5-B".to_string(),
        teacher_id: TEACHER.to_string(),
        present: false,
        absent_reason: String::new(),
        attendance_percentage: 0.0,
        phone: None,
        guardian_name: None,
        address: None,
    }
}

pub struct TestContext {
    pub store: MemoryStore,
    pub repository: Repository,
    pub services: Services,
    pub clock: FixedClock,
}

impl TestContext {
    pub fn new(today: NaiveDate) -> Self {
        let store = MemoryStore::new();
        Self::with_store(store.clone(), Arc::new(store), today)
    }

    /// `store` backs the services; `inspect` is the same data seen unwrapped
    pub fn with_store(inspect: MemoryStore, store: Arc<dyn DocumentStore>, today: NaiveDate) -> Self {
        let clock = FixedClock::new(today);
        let repository = Repository::new(store);
        let services = Services::new(repository.clone(), Arc::new(clock.clone()));
        Self {
            store: inspect,
            repository,
            services,
            clock,
        }
    }

    pub async fn seed_roster(&self, students: &[(&str, &str)]) {
        for (id, roll) in students {
            self.repository.students.save(&student(id, roll)).await.unwrap();
        }
    }

    pub async fn declare_holiday(&self, date: NaiveDate, name: &str) {
        self.repository
            .holidays
            .save(&Holiday { date, name: name.to_string() })
            .await
            .unwrap();
    }

    /// Count attendance records the repository can see for a pair
    pub async fn records_for(&self, student_id: &str, date: NaiveDate) -> usize {
        self.repository.attendance.find(student_id, date).await.unwrap().len()
    }
}
