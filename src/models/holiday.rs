//! Holiday model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// A declared holiday; attendance cannot be taken on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Holiday {
    /// Holiday date (DD/MM/YYYY)
    #[serde(with = "crate::dates::holiday_format")]
    #[schema(value_type = String, example = "25/12/2024")]
    pub date: NaiveDate,
    pub name: String,
}

impl Holiday {
    /// One holiday per date, so the date alone keys the document
    pub fn document_id(date: NaiveDate) -> String {
        crate::dates::format_iso_date(date)
    }
}

/// Create holiday request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateHoliday {
    /// Holiday date (DD/MM/YYYY)
    pub date: String,
    #[validate(length(min = 1, max = 80, message = "Holiday name is required"))]
    pub name: String,
}

/// Query parameters for holidays
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct HolidayQuery {
    /// Restrict to a month (YYYY-MM)
    pub month: Option<String>,
}
