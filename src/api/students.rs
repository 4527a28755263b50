//! Roster API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::student::{CreateStudent, RosterQuery, Student, UpdateStudent},
    AppState,
};

use super::CurrentSession;

/// List a teacher's roster
#[utoipa::path(
    get,
    path = "/students",
    tag = "students",
    params(RosterQuery),
    responses(
        (status = 200, description = "Roster ordered by roll number", body = Vec<Student>)
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<RosterQuery>,
) -> AppResult<Json<Vec<Student>>> {
    let students = state
        .services
        .roster
        .list(&session, query.teacher_id.as_deref())
        .await?;
    Ok(Json(students))
}

/// Get a student
#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "students",
    params(("id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student", body = Student),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> AppResult<Json<Student>> {
    let student = state.services.roster.get(&session, &id).await?;
    Ok(Json(student))
}

/// Add a student to the caller's roster
#[utoipa::path(
    post,
    path = "/students",
    tag = "students",
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Invalid data or duplicate roll number")
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(data): Json<CreateStudent>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let student = state.services.roster.create(&session, &data).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// Update a student
#[utoipa::path(
    put,
    path = "/students/{id}",
    tag = "students",
    params(("id" = String, Path, description = "Student ID")),
    request_body = UpdateStudent,
    responses(
        (status = 200, description = "Student updated", body = Student)
    )
)]
pub async fn update_student(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(data): Json<UpdateStudent>,
) -> AppResult<Json<Student>> {
    let student = state.services.roster.update(&session, &id, &data).await?;
    Ok(Json(student))
}

/// Remove a student from the roster (attendance history is kept)
#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "students",
    params(("id" = String, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student removed")
    )
)]
pub async fn delete_student(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.roster.delete(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
