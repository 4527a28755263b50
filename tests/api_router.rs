//! HTTP surface, driven in-process through the router

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;
use rollcall_server::{
    api::{self, SCHOOL_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER},
    config::AppConfig,
    repository::Repository,
    services::FixedClock,
    AppState,
};

fn app() -> Router {
    let clock = FixedClock::new(ymd(2024, 3, 4));
    let state = AppState::new(AppConfig::default(), Repository::in_memory(), Arc::new(clock));
    api::create_router(state)
}

fn request(method: Method, uri: &str, who: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, role)) = who {
        builder = builder
            .header(USER_ID_HEADER, user)
            .header(USER_ROLE_HEADER, role)
            .header(SCHOOL_ID_HEADER, SCHOOL);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

const T1: Option<(&str, &str)> = Some((TEACHER, "teacher"));

#[tokio::test]
async fn health_needs_no_session() {
    let app = app();
    let (status, body) = send(&app, request(Method::GET, "/api/v1/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, request(Method::GET, "/api/v1/ready", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn missing_session_is_unauthorized() {
    let app = app();
    let (status, body) = send(&app, request(Method::GET, "/api/v1/students", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["retryable"], false);

    let bad_role = Some((TEACHER, "janitor"));
    let (status, _) = send(&app, request(Method::GET, "/api/v1/students", bad_role, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_day_of_attendance_over_http() {
    let app = app();

    let mut ids = Vec::new();
    for (name, roll) in [("Asha", "1"), ("Bilal", "2")] {
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/v1/students",
                T1,
                Some(json!({ "name": name, "rollNumber": roll, "class": "5-B" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["teacherID"], TEACHER);
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let (status, body) = send(&app, request(Method::POST, "/api/v1/attendance/today", T1, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"].as_array().unwrap().len(), 2);
    assert_eq!(body["cancelled"], false);
    assert_eq!(body["view"]["day"]["kind"], "working");

    let absent_uri = format!("/api/v1/attendance/{}/absent", ids[0]);
    let (status, body) = send(
        &app,
        request(Method::PUT, &absent_uri, T1, Some(json!({ "reason": "  " }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = send(
        &app,
        request(Method::PUT, &absent_uri, T1, Some(json!({ "reason": "fever" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["present"], false);
    assert_eq!(body["absentReason"], "fever");
    assert_eq!(body["currentDate"], "2024-03-04");

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/attendance/roster?date=2024-03-04", T1, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"][0]["status"]["state"], "absent");
    assert_eq!(body["entries"][1]["status"]["state"], "present");

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/attendance/summary?month=2024-03", T1, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["presentDays"], 0);
    assert_eq!(rows[1]["presentDays"], 1);
    assert_eq!(rows[1]["workingDays"], 26);

    let history_uri = format!("/api/v1/students/{}/attendance?month=2024-03", ids[0]);
    let (status, body) = send(&app, request(Method::GET, &history_uri, T1, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn holiday_blocks_marking_over_http() {
    let app = app();
    let head = Some(("H1", "head_teacher"));

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/holidays",
            head,
            Some(json!({ "date": "04/03/2024", "name": "Founders Day" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/holidays",
            head,
            Some(json!({ "date": "04/03/2024", "name": "Again" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");

    let (_, student) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/students",
            T1,
            Some(json!({ "name": "Asha", "rollNumber": "1", "class": "5-B" })),
        ),
    )
    .await;
    let uri = format!("/api/v1/attendance/{}/present", student["id"].as_str().unwrap());
    let (status, body) = send(&app, request(Method::PUT, &uri, T1, None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "AttendanceClosed");

    let (status, body) = send(&app, request(Method::POST, "/api/v1/attendance/today", T1, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["created"].as_array().unwrap().is_empty());
    assert_eq!(body["view"]["day"]["name"], "Founders Day");

    let (status, _) = send(
        &app,
        request(Method::DELETE, "/api/v1/holidays/2024-03-04", head, None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn teachers_only_see_their_roster() {
    let app = app();
    let (status, _) = send(
        &app,
        request(Method::GET, "/api/v1/students?teacher_id=T1", Some((OTHER_TEACHER, "teacher")), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
