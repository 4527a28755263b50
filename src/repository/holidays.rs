//! Holidays collection

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use super::{from_document, to_document, DocumentStore, HOLIDAYS};
use crate::{
    dates::{format_holiday_date, YearMonth},
    error::AppResult,
    models::holiday::Holiday,
};

#[derive(Clone)]
pub struct HolidaysRepository {
    store: Arc<dyn DocumentStore>,
}

impl HolidaysRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All holidays, ordered by date
    pub async fn list(&self) -> AppResult<Vec<Holiday>> {
        let mut holidays = self
            .store
            .list(HOLIDAYS)
            .await?
            .into_iter()
            .map(from_document)
            .collect::<AppResult<Vec<Holiday>>>()?;
        holidays.sort_by_key(|h| h.date);
        Ok(holidays)
    }

    pub async fn list_in_month(&self, month: YearMonth) -> AppResult<Vec<Holiday>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|h| month.contains(h.date))
            .collect())
    }

    pub async fn dates_in_month(&self, month: YearMonth) -> AppResult<HashSet<NaiveDate>> {
        Ok(self
            .list_in_month(month)
            .await?
            .into_iter()
            .map(|h| h.date)
            .collect())
    }

    /// The holiday declared on `date`, if any
    pub async fn find_by_date(&self, date: NaiveDate) -> AppResult<Option<Holiday>> {
        let found = self
            .store
            .query_by_field(HOLIDAYS, "date", &Value::from(format_holiday_date(date)))
            .await?;
        found.into_iter().next().map(from_document).transpose()
    }

    pub async fn save(&self, holiday: &Holiday) -> AppResult<()> {
        self.store
            .upsert(HOLIDAYS, &Holiday::document_id(holiday.date), to_document(holiday)?)
            .await
    }

    pub async fn delete(&self, date: NaiveDate) -> AppResult<()> {
        self.store.delete(HOLIDAYS, &Holiday::document_id(date)).await
    }
}
