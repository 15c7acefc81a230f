/// Integration tests for authorization predicates guarding resource handlers over HTTP
use arc_swap::ArcSwap;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::put,
    Router,
};
use lawyer_office_api::{
    auth::{Identity, UserId},
    config::{Config, UserConfig},
    envelope::ResponseEnvelope,
    error::AppError,
    middleware::RequestLogging,
    observability::{LogRecord, MemorySink},
    permissions::{
        AccessSubject, AdminOrReadOnly, AssignedOrAdmin, IsAuthenticated, ObjectAccess,
        OwnerOrReadOnly, Policy,
    },
    server::create_router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Client file created by user 1
struct ClientFile {
    id: u64,
    created_by: Option<UserId>,
}

impl AccessSubject for ClientFile {
    fn access(&self) -> ObjectAccess {
        ObjectAccess::new().with_owner(self.created_by)
    }
}

/// Appointment created by user 1 and assigned to user 2
struct Appointment {
    id: u64,
    created_by: Option<UserId>,
    lawyer: Option<UserId>,
}

impl AccessSubject for Appointment {
    fn access(&self) -> ObjectAccess {
        ObjectAccess::new()
            .with_owner(self.created_by)
            .with_assigned_to(self.lawyer)
    }
}

async fn client_detail(identity: Identity, method: Method) -> Result<Response, AppError> {
    let policy = Policy::new().with(IsAuthenticated).with(OwnerOrReadOnly);
    policy.check(&identity, &method)?;

    let client = ClientFile {
        id: 10,
        created_by: Some(1),
    };
    policy.check_object(&identity, &method, &client)?;

    Ok(ResponseEnvelope::success(json!({ "id": client.id }), "Client updated", 200).into_response())
}

async fn appointment_detail(identity: Identity, method: Method) -> Result<Response, AppError> {
    let policy = Policy::new().with(IsAuthenticated).with(AssignedOrAdmin);
    policy.check(&identity, &method)?;

    let appointment = Appointment {
        id: 20,
        created_by: Some(1),
        lawyer: Some(2),
    };
    policy.check_object(&identity, &method, &appointment)?;

    Ok(ResponseEnvelope::ok(json!({ "id": appointment.id })).into_response())
}

async fn practice_settings(identity: Identity, method: Method) -> Result<Response, AppError> {
    Policy::new()
        .with(AdminOrReadOnly)
        .check(&identity, &method)?;

    Ok(ResponseEnvelope::ok(json!({ "currency": "EUR" })).into_response())
}

fn user(id: u64, name: &str, is_staff: bool) -> UserConfig {
    UserConfig {
        id,
        username: name.to_string(),
        token: format!("tok-{}", name),
        is_staff,
        enabled: true,
    }
}

fn build_app() -> (Router, Arc<MemorySink>) {
    let mut config = Config::default();
    config.users = vec![
        user(1, "alice", false),
        user(2, "bob", false),
        user(3, "carol", false),
        user(4, "admin", true),
    ];

    let config = Arc::new(ArcSwap::from_pointee(config));
    let sink = Arc::new(MemorySink::new());
    let logging = RequestLogging::new(config.clone(), sink.clone());

    let resources = Router::new()
        .route(
            "/api/v1/clients/10/",
            put(client_detail).get(client_detail),
        )
        .route(
            "/api/v1/appointments/20/",
            put(appointment_detail).get(appointment_detail),
        )
        .route(
            "/api/v1/settings/",
            put(practice_settings).get(practice_settings),
        );

    (create_router(resources, config, logging, None), sink)
}

async fn call(router: Router, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let response = router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_owner_can_update_client() {
    let (router, _) = build_app();
    let (status, body) = call(router, Method::PUT, "/api/v1/clients/10/", Some("tok-alice")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Client updated");
    assert_eq!(body["data"]["id"], 10);
}

#[tokio::test]
async fn test_non_owner_gets_403_envelope_and_warning_record() {
    let (router, sink) = build_app();
    let (status, body) = call(router, Method::PUT, "/api/v1/clients/10/", Some("tok-bob")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "error");
    assert_eq!(body["status_code"], 403);
    assert_eq!(body["errors"]["type"], "permission_denied");
    assert!(body.get("data").is_none());

    let records = sink.records();
    assert_eq!(records.len(), 1);
    match &records[0] {
        LogRecord::Full(record) => {
            assert_eq!(record.status_code, 403);
            assert_eq!(record.request.user, "bob");
            assert_eq!(record.response.as_ref(), Some(&body));
        }
        LogRecord::Timing(_) => panic!("expected a full record"),
    }
}

#[tokio::test]
async fn test_non_owner_may_read_client() {
    let (router, _) = build_app();
    let (status, _) = call(router, Method::GET, "/api/v1/clients/10/", Some("tok-bob")).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_caller_gets_401() {
    let (router, _) = build_app();
    let (status, body) = call(router, Method::GET, "/api/v1/clients/10/", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errors"]["type"], "not_authenticated");
}

#[tokio::test]
async fn test_assigned_lawyer_and_staff_may_edit_appointment() {
    let (router, _) = build_app();
    let (status, _) = call(
        router.clone(),
        Method::PUT,
        "/api/v1/appointments/20/",
        Some("tok-bob"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(router, Method::PUT, "/api/v1/appointments/20/", Some("tok-admin")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_creator_cannot_edit_assigned_appointment() {
    let (router, _) = build_app();

    // assigned_to is set, so ownership is never consulted
    let (status, _) = call(
        router.clone(),
        Method::PUT,
        "/api/v1/appointments/20/",
        Some("tok-alice"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // AssignedOrAdmin does not exempt reads
    let (status, _) = call(router, Method::GET, "/api/v1/appointments/20/", Some("tok-carol")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_settings_are_read_only_for_non_staff() {
    let (router, _) = build_app();

    let (status, body) = call(router.clone(), Method::GET, "/api/v1/settings/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currency"], "EUR");

    let (status, _) = call(router.clone(), Method::PUT, "/api/v1/settings/", Some("tok-carol")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(router, Method::PUT, "/api/v1/settings/", Some("tok-admin")).await;
    assert_eq!(status, StatusCode::OK);
}
