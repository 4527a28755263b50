//! Calendar helpers for attendance dates, holidays and monthly summaries

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Attendance records key their day as `YYYY-MM-DD`
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Holidays are persisted as `DD/MM/YYYY`
pub const HOLIDAY_DATE_FORMAT: &str = "%d/%m/%Y";

pub fn parse_iso_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid date '{}' (use YYYY-MM-DD)", s)))
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

pub fn parse_holiday_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), HOLIDAY_DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid holiday date '{}' (use DD/MM/YYYY)", s)))
}

pub fn format_holiday_date(date: NaiveDate) -> String {
    date.format(HOLIDAY_DATE_FORMAT).to_string()
}

pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

/// A calendar month, written `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AppError::Validation(format!("Invalid month {}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .map(|next| next - Duration::days(1))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every calendar day of the month, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |d| *d <= last)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for YearMonth {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("Invalid month '{}' (use YYYY-MM)", s));
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year = y.parse::<i32>().map_err(|_| invalid())?;
        let month = m.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for YearMonth {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<YearMonth> for String {
    fn from(m: YearMonth) -> Self {
        m.to_string()
    }
}

/// Days of `month` that are neither Sundays nor declared holidays
pub fn working_days(month: YearMonth, holidays: &HashSet<NaiveDate>) -> u32 {
    month
        .days()
        .filter(|d| !is_sunday(*d) && !holidays.contains(d))
        .count() as u32
}

/// Share of working days present, in percent, rounded to two decimals
pub fn attendance_percentage(present_days: u32, working_days: u32) -> f64 {
    if working_days == 0 {
        return 0.0;
    }
    let pct = f64::from(present_days) * 100.0 / f64::from(working_days);
    (pct * 100.0).round() / 100.0
}

/// Serde adapter for holiday dates stored as `DD/MM/YYYY`
pub mod holiday_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_holiday_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(s.trim(), super::HOLIDAY_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
