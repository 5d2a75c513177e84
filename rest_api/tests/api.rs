// rest_api/tests/api.rs
//! End-to-end tests driving the router directly with `tower::oneshot`:
//! login, role enforcement, and the main billing/inventory/clinical
//! flows against an in-memory database.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use rest_api::config::{AppConfig, BootstrapAdmin, ClinicInfo};
use rest_api::{AppState, app, ensure_bootstrap_admin};
use storage::Database;

const ADMIN_PASSWORD: &str = "Adm1n!Pass";

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_path: ":memory:".into(),
        jwt_secret: "integration-test-secret-0123456789ab".into(),
        jwt_expire_minutes: 60,
        environment: "test".into(),
        allowed_origins: vec!["*".into()],
        clinic: ClinicInfo {
            name: "Riverside Pet Clinic".into(),
            address: "123 Main Street".into(),
            phone: "+1 555 0100".into(),
            hours: "Mon-Sat".into(),
            about: "test clinic".into(),
        },
        bootstrap_admin: BootstrapAdmin {
            name: "Administrator".into(),
            username: "admin".into(),
            email: "admin@clinic.test".into(),
            password: ADMIN_PASSWORD.into(),
        },
    }
}

async fn test_app() -> Router {
    let state = AppState::new(Database::open_in_memory().unwrap(), test_config());
    ensure_bootstrap_admin(&state).await.unwrap();
    app(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

/// Creates a staff account as admin and returns a token for it.
async fn staff_token(app: &Router, admin_token: &str, username: &str, role: &str) -> String {
    let password = "Staff!Pw1";
    let (status, body) = send(
        app,
        "POST",
        "/admin/staff",
        Some(admin_token),
        Some(json!({
            "name": format!("{username} person"),
            "username": username,
            "email": format!("{username}@clinic.test"),
            "password": password,
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "staff create failed: {body}");
    login(app, username, password).await
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_and_me_round_trip() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn protected_routes_reject_anonymous_and_wrong_roles() {
    let app = test_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let reception = staff_token(&app, &admin, "frontdesk", "receptionist").await;

    let (status, _) = send(&app, "GET", "/admin/staff", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/admin/staff", Some(&reception), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/reports/dashboard", Some(&reception), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // receptionist endpoints admit admins too
    let (status, _) = send(&app, "GET", "/receptionist/owners", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn staff_creation_is_validated() {
    let app = test_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let weak = json!({
        "name": "X", "username": "weak", "email": "weak@clinic.test",
        "password": "short", "role": "doctor",
    });
    let (status, _) = send(&app, "POST", "/admin/staff", Some(&admin), Some(weak)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let as_admin = json!({
        "name": "X", "username": "sneaky", "email": "sneaky@clinic.test",
        "password": "Str0ng!Pw", "role": "admin",
    });
    let (status, _) = send(&app, "POST", "/admin/staff", Some(&admin), Some(as_admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    staff_token(&app, &admin, "docone", "doctor").await;
    let duplicate = json!({
        "name": "X", "username": "docone", "email": "other@clinic.test",
        "password": "Str0ng!Pw", "role": "doctor",
    });
    let (status, _) = send(&app, "POST", "/admin/staff", Some(&admin), Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_cannot_deactivate_self() {
    let app = test_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, body) = send(
        &app,
        "PATCH",
        "/admin/staff/1",
        Some(&admin),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
}

/// Books an owner, pet and appointment; returns (owner_id, pet_id,
/// appointment_id).
async fn book_appointment(app: &Router, reception: &str) -> (i64, i64, i64) {
    let (status, owner) = send(
        app,
        "POST",
        "/receptionist/owners",
        Some(reception),
        Some(json!({ "name": "Maya", "phone": "555-0101" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let owner_id = owner["id"].as_i64().unwrap();

    let (status, pet) = send(
        app,
        "POST",
        &format!("/receptionist/owners/{owner_id}/pets"),
        Some(reception),
        Some(json!({ "name": "Biscuit", "species": "dog", "age": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let pet_id = pet["id"].as_i64().unwrap();

    let (status, appt) = send(
        app,
        "POST",
        "/receptionist/appointments",
        Some(reception),
        Some(json!({
            "owner_id": owner_id,
            "pet_id": pet_id,
            "appointment_date": "2026-09-01",
            "appointment_time": "10:30:00",
            "type": "scheduled",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "booking failed: {appt}");
    assert_eq!(appt["status"], "scheduled");
    (owner_id, pet_id, appt["id"].as_i64().unwrap())
}

#[tokio::test]
async fn billing_flow_computes_and_notifies() {
    let app = test_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let reception = staff_token(&app, &admin, "frontdesk", "receptionist").await;
    let (owner_id, _pet_id, appointment_id) = book_appointment(&app, &reception).await;

    let (status, consult) = send(
        &app,
        "POST",
        "/billing/services",
        Some(&admin),
        Some(json!({ "name": "Consultation", "category": "general", "price": "500" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, deworm) = send(
        &app,
        "POST",
        "/billing/services",
        Some(&admin),
        Some(json!({ "name": "Deworming", "price": "300" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // a zero price is rejected at the boundary
    let (status, _) = send(
        &app,
        "POST",
        "/billing/services",
        Some(&admin),
        Some(json!({ "name": "Free", "price": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, invoice) = send(
        &app,
        "POST",
        "/billing/invoices",
        Some(&reception),
        Some(json!({
            "appointment_id": appointment_id,
            "owner_id": owner_id,
            "items": [
                { "service_id": consult["id"], "quantity": 2 },
                { "service_id": deworm["id"], "quantity": 1 },
            ],
            "discount_pct": "10",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "invoice failed: {invoice}");
    assert_eq!(invoice["total_amount"], "1300");
    assert_eq!(invoice["final_amount"], "1170.0");
    assert_eq!(invoice["payment_status"], "pending");
    let invoice_id = invoice["id"].as_i64().unwrap();

    let (status, paid) = send(
        &app,
        "PATCH",
        &format!("/billing/invoices/{invoice_id}/pay"),
        Some(&reception),
        Some(json!({ "payment_method": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["payment_status"], "paid");
    assert_eq!(paid["payment_method"], "cash");

    // booking + payment each left a notification row
    let (status, logs) = send(
        &app,
        "GET",
        &format!("/notifications/logs?owner_id={owner_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs[0]["message"].as_str().unwrap().contains("Payment"));
    assert!(logs.iter().all(|log| log["status"] == "sent"));
}

#[tokio::test]
async fn invoice_with_unknown_service_is_atomic() {
    let app = test_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let reception = staff_token(&app, &admin, "frontdesk", "receptionist").await;

    let (status, body) = send(
        &app,
        "POST",
        "/billing/invoices",
        Some(&reception),
        Some(json!({
            "appointment_id": 1,
            "owner_id": 1,
            "items": [{ "service_id": 777, "quantity": 1 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Service 777 not found");

    let (status, invoices) = send(&app, "GET", "/billing/invoices", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(invoices.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn medical_record_flow_enforces_ownership() {
    let app = test_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let reception = staff_token(&app, &admin, "frontdesk", "receptionist").await;
    let doctor_a = staff_token(&app, &admin, "doca", "doctor").await;
    let doctor_b = staff_token(&app, &admin, "docb", "doctor").await;
    let (_owner_id, pet_id, appointment_id) = book_appointment(&app, &reception).await;

    let (status, record) = send(
        &app,
        "POST",
        &format!("/doctor/appointments/{appointment_id}/medical-record"),
        Some(&doctor_a),
        Some(json!({ "diagnosis": "otitis", "symptoms": "head shaking" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "record failed: {record}");
    let record_id = record["id"].as_i64().unwrap();

    // the appointment is now completed
    let (_, appt) = send(
        &app,
        "GET",
        &format!("/doctor/appointments/{appointment_id}"),
        Some(&doctor_a),
        None,
    )
    .await;
    assert_eq!(appt["status"], "completed");

    // a second record for the same appointment conflicts
    let (status, _) = send(
        &app,
        "POST",
        &format!("/doctor/appointments/{appointment_id}/medical-record"),
        Some(&doctor_b),
        Some(json!({ "diagnosis": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // only the authoring doctor can edit
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/doctor/medical-records/{record_id}"),
        Some(&doctor_b),
        Some(json!({ "diagnosis": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/doctor/medical-records/{record_id}"),
        Some(&doctor_a),
        Some(json!({ "diagnosis": "otitis externa", "treatment": "drops" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["diagnosis"], "otitis externa");
    assert_eq!(updated["pet_name"], "Biscuit");

    let (status, history) = send(
        &app,
        "GET",
        &format!("/doctor/pets/{pet_id}/history"),
        Some(&doctor_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn inventory_flow_guards_stock_and_buckets_expiry() {
    let app = test_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let soon = chrono::Local::now().date_naive() + chrono::Duration::days(5);
    let (status, item) = send(
        &app,
        "POST",
        "/inventory/items",
        Some(&admin),
        Some(json!({
            "name": "Amoxicillin",
            "category": "medicine",
            "quantity": 10,
            "unit": "bottle",
            "reorder_level": 4,
            "expiry_date": soon.format("%Y-%m-%d").to_string(),
            "cost_price": "25.50",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "item create failed: {item}");
    let item_id = item["id"].as_i64().unwrap();

    // negative quantity and past expiry are boundary-rejected
    let (status, _) = send(
        &app,
        "POST",
        "/inventory/items",
        Some(&admin),
        Some(json!({ "name": "Bad", "quantity": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        "POST",
        "/inventory/items",
        Some(&admin),
        Some(json!({ "name": "Bad", "expiry_date": "2020-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // zero change and blank reason are rejected before storage
    let stock_uri = format!("/inventory/items/{item_id}/stock");
    let (status, _) = send(
        &app,
        "POST",
        &stock_uri,
        Some(&admin),
        Some(json!({ "change_qty": 0, "reason": "noop" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        "POST",
        &stock_uri,
        Some(&admin),
        Some(json!({ "change_qty": 1, "reason": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // draw down past zero fails and leaves the quantity alone
    let (status, body) = send(
        &app,
        "POST",
        &stock_uri,
        Some(&admin),
        Some(json!({ "change_qty": -11, "reason": "too much" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Stock cannot go below zero");

    let (status, adjusted) = send(
        &app,
        "POST",
        &stock_uri,
        Some(&admin),
        Some(json!({ "change_qty": -7, "reason": "Used in surgery" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(adjusted["quantity"], 3);

    let (status, logs) = send(
        &app,
        "GET",
        &format!("/inventory/items/{item_id}/logs"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["change_qty"], -7);

    // now at quantity 3 with reorder level 4 → low stock
    let (status, low) = send(
        &app,
        "GET",
        "/inventory/items?low_stock=true",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(low.as_array().unwrap().len(), 1);

    let (status, alerts) = send(&app, "GET", "/inventory/expiry-alerts", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts["critical"].as_array().unwrap().len(), 1);
    assert_eq!(alerts["critical"][0]["alert_level"], "critical");
    assert_eq!(alerts["total_alerts"], 1);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/inventory/items/{item_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        "GET",
        &format!("/inventory/items/{item_id}/logs"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn website_intake_is_public_and_reuses_owners() {
    let app = test_app().await;

    let (status, info) = send(&app, "GET", "/website/info", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["name"], "Riverside Pet Clinic");

    let request = json!({
        "owner_name": "Walk In",
        "phone": "555-0202",
        "pet_name": "Mittens",
        "species": "cat",
        "preferred_date": "2026-09-10",
        "preferred_time": "15:00:00",
    });
    let (status, first) = send(
        &app,
        "POST",
        "/website/appointments",
        None,
        Some(request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "intake failed: {first}");
    assert!(first["id"].as_i64().is_some());

    // same phone books against the same owner record
    let (status, _second) = send(&app, "POST", "/website/appointments", None, Some(request)).await;
    assert_eq!(status, StatusCode::OK);

    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, owners) = send(
        &app,
        "GET",
        "/receptionist/owners/search?phone=555-0202",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owners.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn dashboard_reports_respond_for_admin() {
    let app = test_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, dashboard) = send(&app, "GET", "/reports/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["active_staff"], 1);

    let (status, revenue) = send(
        &app,
        "GET",
        "/reports/revenue?start=2026-01-01&end=2026-12-31",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(revenue["data"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "GET",
        "/reports/appointments?start=2026-01-01&end=2026-12-31",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/reports/inventory", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}
