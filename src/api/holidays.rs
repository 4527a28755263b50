//! Holiday API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    dates::{self, YearMonth},
    error::AppResult,
    models::holiday::{CreateHoliday, Holiday, HolidayQuery},
    AppState,
};

use super::CurrentSession;

/// List holidays
#[utoipa::path(
    get,
    path = "/holidays",
    tag = "holidays",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Holidays ordered by date", body = Vec<Holiday>)
    )
)]
pub async fn list_holidays(
    State(state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Query(query): Query<HolidayQuery>,
) -> AppResult<Json<Vec<Holiday>>> {
    let month = query
        .month
        .as_deref()
        .map(str::parse::<YearMonth>)
        .transpose()?;
    let holidays = state.services.holidays.list(month).await?;
    Ok(Json(holidays))
}

/// Declare a holiday
#[utoipa::path(
    post,
    path = "/holidays",
    tag = "holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday declared", body = Holiday),
        (status = 409, description = "A holiday already exists on that date")
    )
)]
pub async fn create_holiday(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(data): Json<CreateHoliday>,
) -> AppResult<(StatusCode, Json<Holiday>)> {
    let holiday = state.services.holidays.create(&session, &data).await?;
    Ok((StatusCode::CREATED, Json(holiday)))
}

/// Remove a holiday
#[utoipa::path(
    delete,
    path = "/holidays/{date}",
    tag = "holidays",
    params(("date" = String, Path, description = "Holiday date (YYYY-MM-DD)")),
    responses(
        (status = 204, description = "Holiday removed")
    )
)]
pub async fn delete_holiday(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(date): Path<String>,
) -> AppResult<StatusCode> {
    let date = dates::parse_iso_date(&date)?;
    state.services.holidays.delete(&session, date).await?;
    Ok(StatusCode::NO_CONTENT)
}
