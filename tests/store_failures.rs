//! Reconciler behavior when the document store misbehaves

mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use common::*;
use rollcall_server::{
    error::{AppError, AppResult, Operation},
    models::AttendanceStatus,
    repository::{Document, DocumentStore, MemoryStore, ATTENDANCE, STUDENTS},
    services::CancellationFlag,
};

mock! {
    pub Store {}

    #[async_trait]
    impl DocumentStore for Store {
        async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;
        async fn list(&self, collection: &str) -> AppResult<Vec<Document>>;
        async fn query_by_field(&self, collection: &str, field: &str, value: &Value) -> AppResult<Vec<Document>>;
        async fn query_by_two_fields(
            &self,
            collection: &str,
            field_a: &str,
            value_a: &Value,
            field_b: &str,
            value_b: &Value,
        ) -> AppResult<Vec<Document>>;
        async fn upsert(&self, collection: &str, id: &str, document: Document) -> AppResult<()>;
        async fn update(&self, collection: &str, id: &str, partial: Document) -> AppResult<()>;
        async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;
    }
}

fn student_document(id: &str) -> Document {
    match serde_json::to_value(student(id, "1")).unwrap() {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn failed_write_reports_operation_and_is_retryable() {
    let day = ymd(2024, 3, 4);
    let mut store = MockStore::new();
    store
        .expect_get()
        .withf(|collection, id| collection.to_string() == STUDENTS && id.to_string() == "S1")
        .returning(|_, id| Ok(Some(student_document(id))));
    store.expect_query_by_field().returning(|_, _, _| Ok(Vec::new()));
    store.expect_list().returning(|_| Ok(Vec::new()));
    store
        .expect_query_by_two_fields()
        .returning(|_, _, _, _, _| Ok(Vec::new()));
    store
        .expect_upsert()
        .withf(|collection, id, _| collection.to_string() == ATTENDANCE && id.to_string() == "S1_2024-03-04")
        .times(1)
        .returning(|_, _, _| Err(AppError::StoreUnavailable("connection reset".into())));
    store.expect_update().never();

    let ctx = TestContext::with_store(MemoryStore::new(), Arc::new(store), day);
    let err = ctx
        .services
        .attendance
        .set_absent(&teacher(), "S1", day, "fever")
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match err {
        AppError::Mutation { operation, student_id, date, .. } => {
            assert_eq!(operation, Operation::SetAbsent);
            assert_eq!(student_id, "S1");
            assert_eq!(date, day);
        }
        other => panic!("expected a mutation error, got {:?}", other),
    }
}

#[tokio::test]
async fn blank_reason_never_touches_the_store() {
    let day = ymd(2024, 3, 4);
    // No expectations: any store call panics
    let store = MockStore::new();
    let ctx = TestContext::with_store(MemoryStore::new(), Arc::new(store), day);

    let err = ctx
        .services
        .attendance
        .set_absent(&teacher(), "S1", day, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

/// Memory store that fails attendance writes for chosen students, fails
/// reads or updates of whole collections, and can raise a cancellation
/// after a number of successful writes
struct FlakyStore {
    inner: MemoryStore,
    failing: HashSet<String>,
    failing_reads: HashSet<String>,
    failing_updates: HashSet<String>,
    cancel_after: Option<(usize, CancellationFlag)>,
    writes: AtomicUsize,
}

impl FlakyStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
            failing_reads: HashSet::new(),
            failing_updates: HashSet::new(),
            cancel_after: None,
            writes: AtomicUsize::new(0),
        }
    }

    fn failing_for(mut self, student_id: &str) -> Self {
        self.failing.insert(student_id.to_string());
        self
    }

    fn failing_reads_in(mut self, collection: &str) -> Self {
        self.failing_reads.insert(collection.to_string());
        self
    }

    fn failing_updates_in(mut self, collection: &str) -> Self {
        self.failing_updates.insert(collection.to_string());
        self
    }

    fn cancelling_after(mut self, writes: usize, flag: CancellationFlag) -> Self {
        self.cancel_after = Some((writes, flag));
        self
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        if self.failing_reads.contains(collection) {
            return Err(AppError::StoreUnavailable(format!("read of {} timed out", id)));
        }
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn query_by_field(&self, collection: &str, field: &str, value: &Value) -> AppResult<Vec<Document>> {
        self.inner.query_by_field(collection, field, value).await
    }

    async fn query_by_two_fields(
        &self,
        collection: &str,
        field_a: &str,
        value_a: &Value,
        field_b: &str,
        value_b: &Value,
    ) -> AppResult<Vec<Document>> {
        self.inner
            .query_by_two_fields(collection, field_a, value_a, field_b, value_b)
            .await
    }

    async fn upsert(&self, collection: &str, id: &str, document: Document) -> AppResult<()> {
        if collection == ATTENDANCE {
            let sid = document.get("sid").and_then(Value::as_str).unwrap_or_default();
            if self.failing.contains(sid) {
                return Err(AppError::StoreUnavailable(format!("write of {} timed out", id)));
            }
        }
        self.inner.upsert(collection, id, document).await?;
        if collection == ATTENDANCE {
            let written = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((limit, flag)) = &self.cancel_after {
                if written >= *limit {
                    flag.cancel();
                }
            }
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, partial: Document) -> AppResult<()> {
        if self.failing_updates.contains(collection) {
            return Err(AppError::StoreUnavailable(format!("update of {} timed out", id)));
        }
        self.inner.update(collection, id, partial).await
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        self.inner.delete(collection, id).await
    }
}

#[tokio::test]
async fn one_failing_student_does_not_stop_the_default() {
    let day = ymd(2024, 3, 4);
    let memory = MemoryStore::new();
    let flaky = FlakyStore::new(memory.clone()).failing_for("S2");
    let ctx = TestContext::with_store(memory, Arc::new(flaky), day);
    ctx.seed_roster(&[("S1", "1"), ("S2", "2"), ("S3", "3")]).await;

    let outcome = ctx
        .services
        .attendance
        .ensure_default_for_today(&teacher(), TEACHER, day, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(outcome.created, vec!["S1", "S3"]);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.student_id, "S2");
    assert_eq!(failure.operation, Operation::EnsureDefault);
    assert!(failure.retryable);

    assert_eq!(outcome.view.status_of("S2"), Some(&AttendanceStatus::Unset));
    assert_eq!(ctx.store.count(ATTENDANCE).await, 2);
    assert_eq!(ctx.records_for("S2", day).await, 0);
}

#[tokio::test]
async fn cancellation_stops_further_default_writes() {
    let day = ymd(2024, 3, 4);
    let cancel = CancellationFlag::new();
    let memory = MemoryStore::new();
    let flaky = FlakyStore::new(memory.clone()).cancelling_after(1, cancel.clone());
    let ctx = TestContext::with_store(memory, Arc::new(flaky), day);
    ctx.seed_roster(&[("S1", "1"), ("S2", "2"), ("S3", "3")]).await;

    let outcome = ctx
        .services
        .attendance
        .ensure_default_for_today(&teacher(), TEACHER, day, &cancel)
        .await
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.created, vec!["S1"]);
    assert_eq!(ctx.store.count(ATTENDANCE).await, 1);
    assert_eq!(outcome.view.status_of("S1"), Some(&AttendanceStatus::Present));
    assert_eq!(outcome.view.status_of("S2"), Some(&AttendanceStatus::Unset));

    // The partially defaulted day is left as is: later loads do not fill it in
    let again = ctx
        .services
        .attendance
        .ensure_default_for_today(&teacher(), TEACHER, day, &CancellationFlag::new())
        .await
        .unwrap();
    assert!(again.created.is_empty());
    assert_eq!(ctx.store.count(ATTENDANCE).await, 1);
}

#[tokio::test]
async fn saved_records_count_as_created_when_the_student_refresh_fails() {
    let day = ymd(2024, 3, 4);
    let memory = MemoryStore::new();
    let flaky = FlakyStore::new(memory.clone()).failing_updates_in(STUDENTS);
    let ctx = TestContext::with_store(memory, Arc::new(flaky), day);
    ctx.seed_roster(&[("S1", "1"), ("S2", "2")]).await;

    let outcome = ctx
        .services
        .attendance
        .ensure_default_for_today(&teacher(), TEACHER, day, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(outcome.created, vec!["S1", "S2"]);
    assert_eq!(outcome.view.status_of("S1"), Some(&AttendanceStatus::Present));
    assert_eq!(outcome.view.present_count(), 2);
    assert_eq!(ctx.store.count(ATTENDANCE).await, 2);

    let failed: Vec<_> = outcome.failures.iter().map(|f| f.student_id.as_str()).collect();
    assert_eq!(failed, vec!["S1", "S2"]);
    for failure in &outcome.failures {
        assert_eq!(failure.operation, Operation::RefreshStudent);
        assert!(failure.retryable);
    }
}

#[tokio::test]
async fn refresh_failure_after_a_mark_names_the_refresh() {
    let day = ymd(2024, 3, 4);
    let memory = MemoryStore::new();
    let flaky = FlakyStore::new(memory.clone()).failing_updates_in(STUDENTS);
    let ctx = TestContext::with_store(memory, Arc::new(flaky), day);
    ctx.seed_roster(&[("S1", "1")]).await;

    let err = ctx
        .services
        .attendance
        .set_absent(&teacher(), "S1", day, "fever")
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(
        err,
        AppError::Mutation { operation: Operation::RefreshStudent, .. }
    ));
    // The record itself was written
    let stored = ctx.repository.attendance.find("S1", day).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].absent_reason, "fever");
}

#[tokio::test]
async fn failed_student_read_carries_mutation_context() {
    let day = ymd(2024, 3, 4);
    let memory = MemoryStore::new();
    let flaky = FlakyStore::new(memory.clone()).failing_reads_in(STUDENTS);
    let ctx = TestContext::with_store(memory, Arc::new(flaky), day);
    ctx.seed_roster(&[("S1", "1")]).await;

    let err = ctx
        .services
        .attendance
        .set_absent(&teacher(), "S1", day, "fever")
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match err {
        AppError::Mutation { operation, student_id, date, .. } => {
            assert_eq!(operation, Operation::SetAbsent);
            assert_eq!(student_id, "S1");
            assert_eq!(date, day);
        }
        other => panic!("expected a mutation error, got {:?}", other),
    }
    assert_eq!(ctx.store.count(ATTENDANCE).await, 0);
}
