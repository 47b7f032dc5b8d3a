use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use ed_rostering::api::{router, AppState};
use ed_rostering::config::RosterConfig;
use ed_rostering::domain::NightRule;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(AppState::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let request = match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "UP" }));
}

#[tokio::test]
async fn test_doctor_lifecycle() {
    let app = app();

    let (status, doctor) =
        send(&app, Method::POST, "/doctors", Some(json!({ "name": "Amy Cole" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doctor["id"], "D01");
    assert_eq!(doctor["contractHoursPerMonth"], 175.0);
    assert_eq!(doctor["minShiftsPerMonth"], 16);
    assert_eq!(doctor["maxShiftsPerMonth"], 18);

    let bad_bounds = json!({
        "contractHoursPerMonth": 160.0,
        "minShiftsPerMonth": 12,
        "maxShiftsPerMonth": 10
    });
    let (status, body) = send(&app, Method::PUT, "/doctors/D01/bounds", Some(bad_bounds)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));

    let (status, _) = send(&app, Method::DELETE, "/doctors/D01", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, active) = send(&app, Method::GET, "/doctors?activeOnly=true", None).await;
    assert_eq!(active, json!([]));
    let (_, all) = send(&app, Method::GET, "/doctors", None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, "/doctors/D09", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_shifts_replaces_month() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/shifts/generate",
        Some(json!({ "year": 2026, "month": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 140);

    send(&app, Method::POST, "/shifts/generate", Some(json!({ "year": 2026, "month": 2 }))).await;
    let (_, shifts) = send(&app, Method::GET, "/shifts", None).await;
    assert_eq!(shifts.as_array().unwrap().len(), 140);
    assert_eq!(shifts[0]["id"], "2026-02-01-00");

    let (status, _) = send(
        &app,
        Method::POST,
        "/shifts/generate",
        Some(json!({ "year": 2026, "month": 13 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_leave_endpoints() {
    let app = app();
    send(&app, Method::POST, "/doctors", Some(json!({ "name": "Amy Cole" }))).await;

    let unknown = json!({ "doctorId": "D42", "startDate": "2026-02-03", "endDate": "2026-02-04" });
    let (status, _) = send(&app, Method::POST, "/leave", Some(unknown)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let valid = json!({
        "doctorId": "D01",
        "startDate": "2026-02-03",
        "endDate": "2026-02-04",
        "leaveType": "study"
    });
    let (status, leave) = send(&app, Method::POST, "/leave", Some(valid)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(leave["id"], 1);
    assert_eq!(leave["leaveType"], "study");

    let (status, _) = send(&app, Method::DELETE, "/leave/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, "/leave/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_demo_data_load_and_feasibility() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/demo-data/HUGE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/demo-data/small", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, doctors) = send(&app, Method::GET, "/doctors", None).await;
    assert_eq!(doctors.as_array().unwrap().len(), 16);

    let (status, report) = send(&app, Method::GET, "/feasibility", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["numDoctors"], 16);
    assert_eq!(report["totalMinDemand"], 252);
}

#[tokio::test]
async fn test_demo_data_uses_configured_night_rule() {
    let mut config = RosterConfig::default();
    config.rules.night_rule = NightRule { start_hour: 22 };
    let app = router(Arc::new(AppState::new(config)));

    send(&app, Method::POST, "/demo-data/small", None).await;
    let (_, shifts) = send(&app, Method::GET, "/shifts", None).await;
    let nights = shifts
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["isNight"] == true)
        .count();
    // Weekend nights start at 21:00, so only the 20 weekday nights qualify
    assert_eq!(nights, 20);

    let (_, demo) = send(&app, Method::GET, "/demo-data/SMALL", None).await;
    let demo_nights = demo["shifts"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["isNight"] == true)
        .count();
    assert_eq!(demo_nights, 20);
}

#[tokio::test]
async fn test_naive_roster_and_workload() {
    let app = app();
    send(&app, Method::POST, "/doctors", Some(json!({ "name": "Amy Cole" }))).await;
    send(&app, Method::POST, "/doctors", Some(json!({ "name": "Beth Fox" }))).await;
    send(&app, Method::POST, "/shifts/generate", Some(json!({ "year": 2026, "month": 2 }))).await;

    let (status, roster) = send(&app, Method::POST, "/rosters/naive", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster["label"], "naive/unvalidated");
    assert_eq!(roster["solverStatus"], "NOT_SOLVING");
    // Two doctors capped at 18 shifts each
    assert_eq!(roster["assignments"].as_array().unwrap().len(), 36);
    assert!(!roster["violations"].as_array().unwrap().is_empty());

    let id = roster["id"].as_str().unwrap().to_string();
    let (status, workload) = send(&app, Method::GET, &format!("/rosters/{}/workload", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(workload["doctors"].as_array().unwrap().len(), 2);
    assert_eq!(workload["hours"][0]["shifts"], 18);

    // Sunday 1st 08:00: only the 07-19 day shift is running
    let uri = format!("/rosters/{}/on-duty?at=2026-02-01T08:00:00", id);
    let (status, on_duty) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(on_duty.as_array().unwrap().len(), 2);
    assert_eq!(on_duty[0]["shiftName"], "Day 07-19");

    let uri = format!("/rosters/{}/doctors/D01/upcoming?from=2026-02-01&days=0", id);
    let (status, upcoming) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upcoming.as_array().unwrap().len(), 4);

    let (status, _) = send(&app, Method::DELETE, &format!("/rosters/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/rosters/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_optimized_roster_job_with_empty_store() {
    let app = app();

    let (status, id) = send(&app, Method::POST, "/rosters", None).await;
    assert_eq!(status, StatusCode::OK);
    let id = id.as_str().unwrap().to_string();

    let mut solver_status = String::new();
    for _ in 0..100 {
        let (_, body) = send(&app, Method::GET, &format!("/rosters/{}/status", id), None).await;
        solver_status = body["solverStatus"].as_str().unwrap().to_string();
        if solver_status != "SOLVING" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(solver_status, "NOT_SOLVING");

    let (_, roster) = send(&app, Method::GET, &format!("/rosters/{}", id), None).await;
    assert_eq!(roster["label"], "empty");
    assert_eq!(roster["feasibility"]["feasible"], false);

    let (_, ids) = send(&app, Method::GET, "/rosters", None).await;
    assert_eq!(ids, json!([id]));
}
