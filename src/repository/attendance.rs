//! Attendance collection

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use super::{from_document, to_document, DocumentStore, ATTENDANCE};
use crate::{
    dates::{format_iso_date, YearMonth},
    error::AppResult,
    models::attendance::AttendanceRecord,
};

#[derive(Clone)]
pub struct AttendanceRepository {
    store: Arc<dyn DocumentStore>,
}

impl AttendanceRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Records for a (student, date) pair. More than one only appears in
    /// data written before keys became deterministic.
    pub async fn find(&self, student_id: &str, date: NaiveDate) -> AppResult<Vec<AttendanceRecord>> {
        self.store
            .query_by_two_fields(
                ATTENDANCE,
                "sid",
                &Value::from(student_id),
                "currentDate",
                &Value::from(format_iso_date(date)),
            )
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn list_for_student(&self, student_id: &str) -> AppResult<Vec<AttendanceRecord>> {
        self.store
            .query_by_field(ATTENDANCE, "sid", &Value::from(student_id))
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// A student's records within a month, ordered by date
    pub async fn list_for_student_in_month(
        &self,
        student_id: &str,
        month: YearMonth,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let mut records: Vec<_> = self
            .list_for_student(student_id)
            .await?
            .into_iter()
            .filter(|r| month.contains(r.current_date))
            .collect();
        records.sort_by_key(|r| r.current_date);
        Ok(records)
    }

    /// Atomic insert-or-merge under the record's own id
    pub async fn upsert(&self, record: &AttendanceRecord) -> AppResult<()> {
        self.store
            .upsert(ATTENDANCE, &record.id, to_document(record)?)
            .await
    }

    /// Overwrite the document stored under `id`; `NotFound` if it vanished
    pub async fn update(&self, id: &str, record: &AttendanceRecord) -> AppResult<()> {
        let mut document = to_document(record)?;
        document.insert("id".to_string(), Value::from(id));
        self.store.update(ATTENDANCE, id, document).await
    }
}
