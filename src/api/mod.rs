//! API handlers for Rollcall REST endpoints

pub mod attendance;
pub mod health;
pub mod holidays;
pub mod openapi;
pub mod students;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::session::{Role, Session},
    AppState,
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const SCHOOL_ID_HEADER: &str = "x-school-id";

/// Extractor for the caller's session.
///
/// Identity is established upstream; the gateway forwards it in the
/// `X-User-Id`, `X-User-Role` and `X-School-Id` headers.
pub struct CurrentSession(pub Session);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Authentication(format!("Missing {} header", name)))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)?;
        let role: Role = header(parts, USER_ROLE_HEADER)?
            .parse()
            .map_err(AppError::Authentication)?;
        let school_id = header(parts, SCHOOL_ID_HEADER)?;

        Ok(CurrentSession(Session::new(user_id, role, school_id)))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Roster
        .route("/students", get(students::list_students).post(students::create_student))
        .route(
            "/students/:id",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/students/:id/attendance", get(attendance::student_history))
        // Attendance
        .route("/attendance/today", post(attendance::open_today))
        .route("/attendance/roster", get(attendance::roster_view))
        .route("/attendance/summary", get(attendance::monthly_summary))
        .route("/attendance/:student_id/absent", put(attendance::mark_absent))
        .route("/attendance/:student_id/present", put(attendance::mark_present))
        // Holidays
        .route("/holidays", get(holidays::list_holidays).post(holidays::create_holiday))
        .route("/holidays/:date", axum::routing::delete(holidays::delete_holiday))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
