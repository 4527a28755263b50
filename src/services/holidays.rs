//! Holidays service

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    dates::{self, YearMonth},
    error::{AppError, AppResult},
    models::{
        holiday::{CreateHoliday, Holiday},
        session::Session,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct HolidaysService {
    repository: Repository,
}

impl HolidaysService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All holidays, or those of one month
    pub async fn list(&self, month: Option<YearMonth>) -> AppResult<Vec<Holiday>> {
        match month {
            Some(m) => self.repository.holidays.list_in_month(m).await,
            None => self.repository.holidays.list().await,
        }
    }

    /// Declare a holiday; one per date
    pub async fn create(&self, session: &Session, data: &CreateHoliday) -> AppResult<Holiday> {
        session.require_holiday_manager()?;
        data.validate()?;
        let name = data.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Holiday name is required".to_string()));
        }
        let date = dates::parse_holiday_date(&data.date)?;

        if let Some(existing) = self.repository.holidays.find_by_date(date).await? {
            return Err(AppError::Conflict(format!(
                "{} is already declared as {}",
                data.date.trim(),
                existing.name
            )));
        }

        let holiday = Holiday {
            date,
            name: name.to_string(),
        };
        self.repository.holidays.save(&holiday).await?;
        tracing::info!(school = %session.school_id, %date, name, "Holiday declared");
        Ok(holiday)
    }

    pub async fn delete(&self, session: &Session, date: NaiveDate) -> AppResult<()> {
        session.require_holiday_manager()?;
        self.repository.holidays.delete(date).await
    }
}
