//! Attendance reconciler
//!
//! Keeps exactly one record per (student, date). Records are keyed by
//! `{student}_{date}` and written with the store's atomic upsert, so two
//! racing writers converge on one document instead of inserting twice.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    dates::{self, YearMonth},
    error::{AppError, AppResult, Operation},
    models::{
        attendance::{
            AttendanceEvent, AttendanceRecord, AttendanceStatus, DayKind, DefaultOutcome,
            MutationFailure, RosterEntry, RosterView, StudentSummary,
        },
        session::Session,
        student::Student,
    },
    repository::Repository,
    services::clock::{CancellationFlag, Clock},
};

/// Holidays and working-day count of one month
struct MonthCalendar {
    month: YearMonth,
    holidays: HashSet<NaiveDate>,
    working_days: u32,
}

#[derive(Clone)]
pub struct AttendanceService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Sunday, declared holiday, or a working day
    pub async fn day_kind(&self, date: NaiveDate) -> AppResult<DayKind> {
        if dates::is_sunday(date) {
            return Ok(DayKind::Sunday);
        }
        Ok(match self.repository.holidays.find_by_date(date).await? {
            Some(holiday) => DayKind::Holiday { name: holiday.name },
            None => DayKind::Working,
        })
    }

    /// Only the current date can change; earlier and later days are read-only
    fn require_today(&self, date: NaiveDate) -> AppResult<()> {
        let today = self.clock.today();
        if date != today {
            return Err(AppError::AttendanceClosed(format!(
                "Attendance for {} is read-only (today is {})",
                date, today
            )));
        }
        Ok(())
    }

    /// A roster annotated with the statuses recorded on `date`, without writing
    pub async fn roster_view(&self, session: &Session, teacher_id: &str, date: NaiveDate) -> AppResult<RosterView> {
        session.require_roster_reader(teacher_id)?;
        let roster = self.repository.students.list_by_teacher(teacher_id).await?;
        let day = self.day_kind(date).await?;
        self.load_view(roster, date, day).await
    }

    async fn load_view(&self, roster: Vec<Student>, date: NaiveDate, day: DayKind) -> AppResult<RosterView> {
        let mut entries = Vec::with_capacity(roster.len());
        for student in roster {
            let status = self.current_status(&student.id, date).await?.0;
            entries.push(RosterEntry { student, status });
        }
        Ok(RosterView { date, day, entries })
    }

    /// Current status plus the id of the stored record, if any. A record
    /// under the composite key wins over older randomly keyed duplicates.
    async fn current_status(&self, student_id: &str, date: NaiveDate) -> AppResult<(AttendanceStatus, Option<String>)> {
        let records = self.repository.attendance.find(student_id, date).await?;
        let key = AttendanceRecord::composite_id(student_id, date);
        let chosen = records
            .iter()
            .find(|r| r.id == key)
            .or_else(|| records.first());
        Ok(match chosen {
            Some(record) => (record.status(), Some(record.id.clone())),
            None => (AttendanceStatus::Unset, None),
        })
    }

    /// Load today's roster, defaulting everyone to present the first time the
    /// day is opened.
    ///
    /// Nothing is written on Sundays or holidays, or when any student already
    /// has a record for the date. Writes are per student: a failure is
    /// reported in the outcome and the remaining students are still tried.
    /// A student whose record was saved counts as created even when the
    /// follow-up student refresh fails; that failure is reported separately.
    /// Once `cancel` is set no further writes are issued.
    pub async fn ensure_default_for_today(
        &self,
        session: &Session,
        teacher_id: &str,
        date: NaiveDate,
        cancel: &CancellationFlag,
    ) -> AppResult<DefaultOutcome> {
        session.require_roster_owner(teacher_id)?;
        self.require_today(date)?;

        let roster = self.repository.students.list_by_teacher(teacher_id).await?;
        let day = self.day_kind(date).await?;
        let mut view = self.load_view(roster, date, day).await?;

        let mut outcome = DefaultOutcome {
            view: view.clone(),
            created: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        };

        if !view.day.is_working() {
            tracing::info!(
                school = %session.school_id,
                teacher = teacher_id,
                %date,
                "No attendance on a closed day"
            );
            return Ok(outcome);
        }

        if view
            .entries
            .iter()
            .any(|e| e.status != AttendanceStatus::Unset)
        {
            tracing::debug!(teacher = teacher_id, %date, "Day already initialized");
            return Ok(outcome);
        }

        let calendar = self.month_calendar(YearMonth::of(date)).await?;
        let students: Vec<Student> = view.entries.iter().map(|e| e.student.clone()).collect();
        for (attempted, student) in students.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    teacher = teacher_id,
                    %date,
                    written = outcome.created.len(),
                    remaining = students.len() - attempted,
                    "Default attendance cancelled"
                );
                outcome.cancelled = true;
                break;
            }

            let record = match self
                .write_record(student, date, &AttendanceStatus::Present, None, Operation::EnsureDefault)
                .await
            {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("{}", e);
                    outcome
                        .failures
                        .push(MutationFailure::from_error(&student.id, Operation::EnsureDefault, &e));
                    continue;
                }
            };
            view = view.with_status(&student.id, AttendanceStatus::Present);
            outcome.created.push(student.id.clone());

            // The record is saved; a stale student copy is reported on its own
            if let Err(e) = self.refresh_student(&record, &calendar).await {
                tracing::warn!("{}", e);
                outcome
                    .failures
                    .push(MutationFailure::from_error(&student.id, Operation::RefreshStudent, &e));
            }
        }

        tracing::info!(
            school = %session.school_id,
            teacher = teacher_id,
            %date,
            created = outcome.created.len(),
            failed = outcome.failures.len(),
            "Default attendance written"
        );

        outcome.view = view;
        Ok(outcome)
    }

    /// Mark a student absent today; the reason must not be blank
    pub async fn set_absent(
        &self,
        session: &Session,
        student_id: &str,
        date: NaiveDate,
        reason: &str,
    ) -> AppResult<AttendanceRecord> {
        let event = AttendanceEvent::MarkAbsent {
            student_id: student_id.to_string(),
            reason: reason.to_string(),
        };
        self.mark(session, event, date).await
    }

    /// Mark a student present today, clearing any absence reason
    pub async fn set_present(&self, session: &Session, student_id: &str, date: NaiveDate) -> AppResult<AttendanceRecord> {
        let event = AttendanceEvent::MarkPresent {
            student_id: student_id.to_string(),
        };
        self.mark(session, event, date).await
    }

    /// Apply one teacher action. Every store failure carries the operation,
    /// student and date; a `RefreshStudent` failure means the record itself
    /// was saved and only the student copy is stale.
    async fn mark(&self, session: &Session, event: AttendanceEvent, date: NaiveDate) -> AppResult<AttendanceRecord> {
        // Rejected before any store call
        event.validate()?;
        self.require_today(date)?;

        let operation = event.operation();
        let student_id = event.student_id();
        let context = |e: AppError| e.in_mutation(operation, student_id, date);

        let student = self
            .repository
            .students
            .get_required(student_id)
            .await
            .map_err(context)?;
        session.require_roster_owner(&student.teacher_id)?;

        self.day_kind(date)
            .await
            .map_err(context)?
            .require_working(date)?;

        let (current, existing_id) = self.current_status(student_id, date).await.map_err(context)?;
        let next = current.after(&event)?;

        let calendar = self.month_calendar(YearMonth::of(date)).await.map_err(context)?;

        let record = self
            .write_record(&student, date, &next, existing_id.as_deref(), operation)
            .await?;
        self.refresh_student(&record, &calendar).await?;

        tracing::info!(
            school = %session.school_id,
            student = student_id,
            %date,
            present = record.present,
            "Attendance marked"
        );
        Ok(record)
    }

    /// Write the record for `status`. A record found under an older random
    /// id is updated in place; if it disappeared meanwhile the composite key
    /// is upserted instead.
    async fn write_record(
        &self,
        student: &Student,
        date: NaiveDate,
        status: &AttendanceStatus,
        existing_id: Option<&str>,
        operation: Operation,
    ) -> AppResult<AttendanceRecord> {
        let context = |e: AppError| e.in_mutation(operation, &student.id, date);

        let mut record = AttendanceRecord::for_status(student, date, status).ok_or_else(|| {
            AppError::Internal(format!("No record for unset status of {}", student.id))
        })?;

        match existing_id {
            Some(id) if id != record.id => {
                match self.repository.attendance.update(id, &record).await {
                    Ok(()) => record.id = id.to_string(),
                    Err(AppError::NotFound(_)) => {
                        tracing::debug!(student = %student.id, %date, "Legacy record gone, upserting");
                        self.repository.attendance.upsert(&record).await.map_err(context)?;
                    }
                    Err(e) => return Err(context(e)),
                }
            }
            _ => self.repository.attendance.upsert(&record).await.map_err(context)?,
        }

        Ok(record)
    }

    /// Copy a written record's status and the month-to-date percentage onto
    /// the student document
    async fn refresh_student(&self, record: &AttendanceRecord, calendar: &MonthCalendar) -> AppResult<()> {
        let context = |e: AppError| e.in_mutation(Operation::RefreshStudent, &record.sid, record.current_date);

        let present_days = self.present_days(&record.sid, calendar).await.map_err(context)?;
        let percentage = dates::attendance_percentage(present_days, calendar.working_days);
        self.repository
            .students
            .set_today_status(&record.sid, record.present, &record.absent_reason, percentage)
            .await
            .map_err(context)
    }

    async fn month_calendar(&self, month: YearMonth) -> AppResult<MonthCalendar> {
        let holidays = self.repository.holidays.dates_in_month(month).await?;
        let working_days = dates::working_days(month, &holidays);
        Ok(MonthCalendar {
            month,
            holidays,
            working_days,
        })
    }

    /// Distinct working days of the month with a present record
    async fn present_days(&self, student_id: &str, calendar: &MonthCalendar) -> AppResult<u32> {
        let records = self
            .repository
            .attendance
            .list_for_student_in_month(student_id, calendar.month)
            .await?;
        let present_dates: HashSet<NaiveDate> = records
            .iter()
            .filter(|r| r.present)
            .map(|r| r.current_date)
            .filter(|d| !dates::is_sunday(*d) && !calendar.holidays.contains(d))
            .collect();
        Ok(present_dates.len() as u32)
    }

    /// Present days over working days for every student on a roster
    pub async fn monthly_summary(
        &self,
        session: &Session,
        teacher_id: &str,
        month: YearMonth,
    ) -> AppResult<Vec<StudentSummary>> {
        session.require_roster_reader(teacher_id)?;

        let roster = self.repository.students.list_by_teacher(teacher_id).await?;
        let calendar = self.month_calendar(month).await?;

        let mut summaries = Vec::with_capacity(roster.len());
        for student in roster {
            let present_days = self.present_days(&student.id, &calendar).await?;
            summaries.push(StudentSummary {
                student_id: student.id,
                name: student.name,
                roll_number: student.roll_number,
                present_days,
                working_days: calendar.working_days,
                percentage: dates::attendance_percentage(present_days, calendar.working_days),
            });
        }
        Ok(summaries)
    }

    /// A student's records for one month, oldest first
    pub async fn student_history(
        &self,
        session: &Session,
        student_id: &str,
        month: YearMonth,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let student = self.repository.students.get_required(student_id).await?;
        session.require_roster_reader(&student.teacher_id)?;
        self.repository
            .attendance
            .list_for_student_in_month(student_id, month)
            .await
    }
}
