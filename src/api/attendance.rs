//! Attendance API endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    dates::{self, YearMonth},
    error::{AppError, AppResult},
    models::attendance::{
        AbsentRequest, AttendanceRecord, DefaultOutcome, MonthQuery, RosterDateQuery, RosterView,
        StudentSummary,
    },
    services::CancellationFlag,
    AppState,
};

use super::CurrentSession;

/// Cancels the flag when the request future is dropped (client went away)
struct CancelOnDrop(CancellationFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

fn month_or_current(month: Option<&str>, state: &AppState) -> AppResult<YearMonth> {
    match month {
        Some(m) => m.parse(),
        None => Ok(YearMonth::of(state.services.attendance.today())),
    }
}

/// Open today's attendance for the caller's roster
///
/// The first call of the day marks every student present. Writes run on a
/// separate task: if the client disconnects, the write in flight finishes
/// and no further students are written.
#[utoipa::path(
    post,
    path = "/attendance/today",
    tag = "attendance",
    responses(
        (status = 200, description = "Today's roster and any default writes", body = DefaultOutcome)
    )
)]
pub async fn open_today(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<DefaultOutcome>> {
    let cancel = CancellationFlag::new();
    let guard = CancelOnDrop(cancel.clone());

    let service = state.services.attendance.clone();
    let date = service.today();
    let task = tokio::spawn(async move {
        let teacher_id = session.user_id.clone();
        service
            .ensure_default_for_today(&session, &teacher_id, date, &cancel)
            .await
    });

    let outcome = task
        .await
        .map_err(|e| AppError::Internal(format!("Attendance task failed: {}", e)))??;
    drop(guard);
    Ok(Json(outcome))
}

/// Read a roster's attendance for a day
#[utoipa::path(
    get,
    path = "/attendance/roster",
    tag = "attendance",
    params(RosterDateQuery),
    responses(
        (status = 200, description = "Roster with statuses", body = RosterView)
    )
)]
pub async fn roster_view(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<RosterDateQuery>,
) -> AppResult<Json<RosterView>> {
    let date = match query.date.as_deref() {
        Some(d) => dates::parse_iso_date(d)?,
        None => state.services.attendance.today(),
    };
    let teacher_id = query.teacher_id.unwrap_or_else(|| session.user_id.clone());
    let view = state
        .services
        .attendance
        .roster_view(&session, &teacher_id, date)
        .await?;
    Ok(Json(view))
}

/// Mark a student absent today
#[utoipa::path(
    put,
    path = "/attendance/{student_id}/absent",
    tag = "attendance",
    params(("student_id" = String, Path, description = "Student ID")),
    request_body = AbsentRequest,
    responses(
        (status = 200, description = "Updated record", body = AttendanceRecord),
        (status = 400, description = "Blank reason"),
        (status = 422, description = "Sunday, holiday or not today")
    )
)]
pub async fn mark_absent(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(student_id): Path<String>,
    Json(data): Json<AbsentRequest>,
) -> AppResult<Json<AttendanceRecord>> {
    let service = &state.services.attendance;
    let record = service
        .set_absent(&session, &student_id, service.today(), &data.reason)
        .await?;
    Ok(Json(record))
}

/// Mark a student present today
#[utoipa::path(
    put,
    path = "/attendance/{student_id}/present",
    tag = "attendance",
    params(("student_id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Updated record", body = AttendanceRecord),
        (status = 422, description = "Sunday, holiday or not today")
    )
)]
pub async fn mark_present(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(student_id): Path<String>,
) -> AppResult<Json<AttendanceRecord>> {
    let service = &state.services.attendance;
    let record = service
        .set_present(&session, &student_id, service.today())
        .await?;
    Ok(Json(record))
}

/// Monthly attendance percentages for a roster
#[utoipa::path(
    get,
    path = "/attendance/summary",
    tag = "attendance",
    params(MonthQuery),
    responses(
        (status = 200, description = "One row per student", body = Vec<StudentSummary>)
    )
)]
pub async fn monthly_summary(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Vec<StudentSummary>>> {
    let month = month_or_current(query.month.as_deref(), &state)?;
    let teacher_id = query.teacher_id.unwrap_or_else(|| session.user_id.clone());
    let summary = state
        .services
        .attendance
        .monthly_summary(&session, &teacher_id, month)
        .await?;
    Ok(Json(summary))
}

/// A student's attendance records for a month
#[utoipa::path(
    get,
    path = "/students/{id}/attendance",
    tag = "attendance",
    params(("id" = String, Path, description = "Student ID"), MonthQuery),
    responses(
        (status = 200, description = "Records, oldest first", body = Vec<AttendanceRecord>)
    )
)]
pub async fn student_history(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Vec<AttendanceRecord>>> {
    let month = month_or_current(query.month.as_deref(), &state)?;
    let records = state
        .services
        .attendance
        .student_history(&session, &id, month)
        .await?;
    Ok(Json(records))
}
