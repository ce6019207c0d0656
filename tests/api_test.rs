mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::TestHub;
use franchise_hub_core::config::CorsOrigins;
use franchise_hub_core::domain::{FranchiseStatus, UserRole};
use franchise_hub_core::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(hub: &TestHub) -> Router {
    let state = AppState {
        services: hub.services.clone(),
        db: None,
    };
    create_app(state, &CorsOrigins::Any)
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header("x-user-id", caller);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_reports_in_memory_store() {
    let hub = TestHub::new();
    let (status, body) = send(app(&hub), "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "in-memory");
}

#[tokio::test]
async fn test_missing_caller_header_is_unauthorized() {
    let hub = TestHub::new();
    let (status, body) = send(app(&hub), "GET", "/notifications", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_unknown_caller_is_unauthorized() {
    let hub = TestHub::new();
    let (status, _) = send(
        app(&hub),
        "GET",
        "/payments/transactions",
        Some("ghost@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_approve_over_http() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    hub.user("partner@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;

    let (status, created) = send(
        app(&hub),
        "POST",
        &format!("/applications?franchise_id={}", franchise.id),
        Some("partner@example.com"),
        Some(json!({ "motivation": "Love tea", "application_fee": "25000" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "UNDER_REVIEW");
    assert_eq!(created["payment_status"], "PENDING");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, duplicate) = send(
        app(&hub),
        "POST",
        &format!("/applications?franchise_id={}", franchise.id),
        Some("partner@example.com"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(duplicate["code"], "conflict");

    let (status, _) = send(
        app(&hub),
        "POST",
        &format!("/applications/{}/approve", id),
        Some("partner@example.com"),
        Some(json!({ "comments": "Self approval" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = send(
        app(&hub),
        "POST",
        &format!("/applications/{}/approve", id),
        Some("owner@example.com"),
        Some(json!({ "comments": "Welcome" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED");
    assert_eq!(approved["review_notes"], "Welcome");
    assert_eq!(approved["reviewed_by"], owner.id.to_string());

    let (status, withdraw) = send(
        app(&hub),
        "POST",
        &format!("/applications/{}/withdraw", id),
        Some("partner@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(withdraw["code"], "invalid_state");

    let (status, mine) = send(
        app(&hub),
        "GET",
        "/applications",
        Some("partner@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, inbox) = send(
        app(&hub),
        "GET",
        "/notifications",
        Some("partner@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox[0]["title"], "Application Approved");
}

#[tokio::test]
async fn test_business_caller_cannot_apply() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;

    let (status, body) = send(
        app(&hub),
        "POST",
        &format!("/applications?franchise_id={}", franchise.id),
        Some("owner@example.com"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "role_mismatch");
}

#[tokio::test]
async fn test_application_visibility() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    hub.user("partner@example.com", UserRole::Partner).await;
    hub.user("other@example.com", UserRole::Partner).await;
    hub.user("admin@example.com", UserRole::Admin).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;

    let application = hub
        .services
        .applications
        .create_application(common::complete_draft(), "partner@example.com", franchise.id)
        .await
        .unwrap();
    let uri = format!("/applications/{}", application.id);

    for caller in ["partner@example.com", "owner@example.com", "admin@example.com"] {
        let (status, _) = send(app(&hub), "GET", &uri, Some(caller), None).await;
        assert_eq!(status, StatusCode::OK, "{} should see the application", caller);
    }

    let (status, _) = send(app(&hub), "GET", &uri, Some("other@example.com"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let by_franchise = format!("/franchises/{}/applications", franchise.id);
    let (status, _) = send(app(&hub), "GET", &by_franchise, Some("owner@example.com"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, list) = send(app(&hub), "GET", &by_franchise, Some("admin@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_request_over_http() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    let partner = hub.user("partner@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;

    let (status, request) = send(
        app(&hub),
        "POST",
        "/payments/requests",
        Some("owner@example.com"),
        Some(json!({
            "to_user_id": partner.id,
            "franchise_id": franchise.id,
            "request_type": "FRANCHISE_FEE",
            "amount": "30000",
            "title": "Franchise fee"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "PENDING");
    let id = request["id"].as_str().unwrap().to_string();

    let (status, received) = send(
        app(&hub),
        "GET",
        "/payments/requests",
        Some("partner@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(received.as_array().unwrap().len(), 1);

    let (status, sent) = send(
        app(&hub),
        "GET",
        "/payments/requests?direction=sent",
        Some("partner@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(sent.as_array().unwrap().is_empty());

    let (status, settlement) = send(
        app(&hub),
        "POST",
        &format!("/payments/requests/{}/pay", id),
        Some("partner@example.com"),
        Some(json!({ "method": "DEBIT_CARD" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settlement["request"]["status"], "PAID");
    assert_eq!(settlement["transaction"]["status"], "SUCCESS");
    assert_eq!(settlement["transaction"]["transaction_type"], "FRANCHISE_FEE");

    let (status, body) = send(
        app(&hub),
        "POST",
        &format!("/payments/requests/{}/cancel", id),
        Some("owner@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    hub.user("admin@example.com", UserRole::Admin).await;
    let (status, stats) = send(
        app(&hub),
        "GET",
        "/payments/stats",
        Some("admin@example.com"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["successful"], 1);
}

#[tokio::test]
async fn test_transaction_access_is_limited_to_payer_and_admin() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    hub.user("partner@example.com", UserRole::Partner).await;
    hub.user("other@example.com", UserRole::Partner).await;
    hub.user("admin@example.com", UserRole::Admin).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;

    let (status, tx) = send(
        app(&hub),
        "POST",
        "/payments/transactions",
        Some("partner@example.com"),
        Some(json!({
            "franchise_id": franchise.id,
            "transaction_type": "MARKETING_FEE",
            "method": "UPI",
            "amount": "1200"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/payments/transactions/{}", tx["id"].as_str().unwrap());

    for caller in ["partner@example.com", "admin@example.com"] {
        let (status, _) = send(app(&hub), "GET", &uri, Some(caller), None).await;
        assert_eq!(status, StatusCode::OK, "{} should see the transaction", caller);
    }
    let (status, body) = send(app(&hub), "GET", &uri, Some("other@example.com"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let status_uri = format!("{}/status", uri);
    for caller in ["other@example.com", "partner@example.com", "owner@example.com"] {
        let (status, _) = send(
            app(&hub),
            "PUT",
            &status_uri,
            Some(caller),
            Some(json!({ "status": "REFUNDED" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} must not update status", caller);
    }

    let (status, _) = send(app(&hub), "GET", &uri, Some("admin@example.com"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, updated) = send(
        app(&hub),
        "PUT",
        &status_uri,
        Some("admin@example.com"),
        Some(json!({ "status": "REFUNDED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "REFUNDED");
}

#[tokio::test]
async fn test_stats_require_admin() {
    let hub = TestHub::new();
    hub.user("partner@example.com", UserRole::Partner).await;
    hub.user("admin@example.com", UserRole::Admin).await;

    for uri in ["/payments/stats", "/applications/stats"] {
        let (status, _) = send(app(&hub), "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} without a caller", uri);

        let (status, _) = send(app(&hub), "GET", uri, Some("partner@example.com"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} as a partner", uri);

        let (status, body) = send(app(&hub), "GET", uri, Some("admin@example.com"), None).await;
        assert_eq!(status, StatusCode::OK, "{} as an admin", uri);
        assert_eq!(body["total"], 0);
    }
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let hub = TestHub::new();
    let (status, doc) = send(app(&hub), "GET", "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/applications/{id}/approve"].is_object());
}
