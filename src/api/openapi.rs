//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{attendance, health, holidays, students};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rollcall API",
        version = "0.1.0",
        description = "School attendance REST API. Callers identify themselves with the X-User-Id, X-User-Role and X-School-Id headers.",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Roster
        students::list_students,
        students::get_student,
        students::create_student,
        students::update_student,
        students::delete_student,
        // Attendance
        attendance::open_today,
        attendance::roster_view,
        attendance::mark_absent,
        attendance::mark_present,
        attendance::monthly_summary,
        attendance::student_history,
        // Holidays
        holidays::list_holidays,
        holidays::create_holiday,
        holidays::delete_holiday,
    ),
    components(
        schemas(
            // Roster
            crate::models::student::Student,
            crate::models::student::CreateStudent,
            crate::models::student::UpdateStudent,
            crate::models::student::RosterQuery,
            // Attendance
            crate::models::attendance::AttendanceRecord,
            crate::models::attendance::RosterEntry,
            crate::models::attendance::RosterView,
            crate::models::attendance::DefaultOutcome,
            crate::models::attendance::MutationFailure,
            crate::models::attendance::StudentSummary,
            crate::models::attendance::AbsentRequest,
            crate::models::attendance::MonthQuery,
            crate::models::attendance::RosterDateQuery,
            // Holidays
            crate::models::holiday::Holiday,
            crate::models::holiday::CreateHoliday,
            crate::models::holiday::HolidayQuery,
            // Session
            crate::models::session::Role,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "students", description = "Roster management"),
        (name = "attendance", description = "Daily attendance and monthly summaries"),
        (name = "holidays", description = "Declared holidays")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
