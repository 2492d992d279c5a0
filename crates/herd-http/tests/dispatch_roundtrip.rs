//! Dispatcher against a live in-process API double.

use axum::extract::{Multipart, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use herd_http::{
    AddressPolicy, ApiClient, Call, ExecutionContext, MultipartForm, Operation, TokenSource,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

fn header(headers: &HeaderMap, name: &str) -> Value {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    match values.as_slice() {
        [] => Value::Null,
        [one] => json!(one),
        many => json!(many),
    }
}

async fn echo(headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "authorization": header(&headers, "authorization"),
        "content_type": header(&headers, "content-type"),
    }))
}

async fn login(headers: HeaderMap, body: String) -> impl IntoResponse {
    let form_type = header(&headers, "content-type") == json!("application/x-www-form-urlencoded");
    if form_type && body.starts_with("username=ghost&") {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "  "})))
    } else if form_type && body == "username=jane&password=secret" {
        (
            StatusCode::OK,
            Json(json!({"access_token": "tok-jane", "token_type": "bearer"})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
    }
}

async fn animal(Path(id): Path<u32>) -> impl IntoResponse {
    if id == 1 {
        (StatusCode::OK, Json(json!({"id": 1, "species": "cattle"})))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Animal not found"})),
        )
    }
}

async fn boom() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn upload(
    Path(id): Path<u32>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.unwrap_or_default();
        fields.push(json!({"name": name, "file_name": file_name, "len": data.len()}));
    }
    Json(json!({
        "animal_id": id,
        "content_type": header(&headers, "content-type"),
        "fields": fields,
    }))
}

async fn spawn_api() -> SocketAddr {
    let app = Router::new()
        .route("/api/v1/auth/me", get(echo))
        .route("/api/v1/animals/", get(echo).post(echo))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/animals/{id}", get(animal))
        .route("/api/v1/animals/{id}/documents", post(upload))
        .route("/api/v1/dashboard/overview", get(boom));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> ApiClient {
    let policy = AddressPolicy::new(Some(format!("http://{}/api/v1", addr)));
    ApiClient::new(&policy, ExecutionContext::Client).unwrap()
}

struct FixedToken(Option<&'static str>);

impl TokenSource for FixedToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

#[tokio::test]
async fn test_no_token_means_no_authorization_header() {
    let addr = spawn_api().await;
    let api = client_for(addr).with_token_source(Arc::new(FixedToken(None)));

    let seen = api.call(Operation::CurrentUser, Call::new()).await.unwrap();
    assert_eq!(seen["authorization"], Value::Null);
    assert_eq!(seen["content_type"], json!("application/json"));
}

#[tokio::test]
async fn test_token_means_exactly_one_bearer_header() {
    let addr = spawn_api().await;
    let api = client_for(addr).with_token_source(Arc::new(FixedToken(Some("abc"))));

    let seen = api.call(Operation::CurrentUser, Call::new()).await.unwrap();
    assert_eq!(seen["authorization"], json!("Bearer abc"));
}

#[tokio::test]
async fn test_json_body_post() {
    let addr = spawn_api().await;
    let api = client_for(addr);

    let seen = api
        .call(
            Operation::CreateAnimal,
            Call::new().json(json!({"tag": "DE-0001", "species": "cattle"})),
        )
        .await
        .unwrap();
    assert_eq!(seen["content_type"], json!("application/json"));
}

#[tokio::test]
async fn test_login_form_success_and_failure() {
    let addr = spawn_api().await;
    let api = client_for(addr);

    let ok = api.login("jane", "secret").await.unwrap();
    assert_eq!(ok["access_token"], json!("tok-jane"));

    let err = api.login("jane", "wrong").await.unwrap_err();
    assert_eq!(err.message(), "Incorrect username or password");
}

#[tokio::test]
async fn test_login_blank_detail_falls_through_to_status_line() {
    let addr = spawn_api().await;
    let api = client_for(addr);

    let err = api.login("ghost", "secret").await.unwrap_err();
    assert_eq!(
        err.message(),
        format!("[POST] \"http://{}/api/v1/auth/login\": 401 Unauthorized", addr)
    );
}

#[tokio::test]
async fn test_detail_surfaced_verbatim() {
    let addr = spawn_api().await;
    let api = client_for(addr);

    let found = api
        .call(Operation::GetAnimal, Call::new().param("id", 1))
        .await
        .unwrap();
    assert_eq!(found["species"], json!("cattle"));

    let missing = api
        .call(Operation::GetAnimal, Call::new().param("id", 2))
        .await
        .unwrap_err();
    assert_eq!(missing.message(), "Animal not found");
}

#[tokio::test]
async fn test_status_without_detail_uses_transport_message() {
    let addr = spawn_api().await;
    let api = client_for(addr);

    let err = api
        .call(Operation::DashboardOverview, Call::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.message(),
        format!(
            "[GET] \"http://{}/api/v1/dashboard/overview\": 500 Internal Server Error",
            addr
        )
    );
}

#[tokio::test]
async fn test_unreachable_api_is_normalized() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client_for(addr);
    let err = api
        .call(Operation::ListAnimals, Call::new())
        .await
        .unwrap_err();
    assert!(!err.message().is_empty());
    assert_ne!(err.message(), "An error occurred");
}

#[tokio::test]
async fn test_multipart_upload_lets_transport_pick_boundary() {
    let addr = spawn_api().await;
    let api = client_for(addr).with_token_source(Arc::new(FixedToken(Some("abc"))));

    let form = MultipartForm::new()
        .text("document_type", "health_certificate")
        .file(
            "file",
            "cert.pdf",
            Some("application/pdf".to_string()),
            &b"%PDF-1.4"[..],
        );
    let seen = api.upload_document(7, form).await.unwrap();

    assert_eq!(seen["animal_id"], json!(7));
    let content_type = seen["content_type"].as_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert_eq!(seen["fields"][0]["name"], json!("document_type"));
    assert_eq!(seen["fields"][1]["file_name"], json!("cert.pdf"));
    assert_eq!(seen["fields"][1]["len"], json!(8));
}

#[tokio::test]
async fn test_server_context_targets_internal_address() {
    let addr = spawn_api().await;
    let policy = AddressPolicy::new(Some("http://127.0.0.1:9/api/v1".to_string()))
        .with_internal(format!("http://{}/api/v1", addr));
    let api = ApiClient::new(&policy, ExecutionContext::Server).unwrap();

    assert_eq!(api.base_url(), format!("http://{}/api/v1", addr));
    let seen = api.call(Operation::CurrentUser, Call::new()).await.unwrap();
    assert_eq!(seen["authorization"], Value::Null);
}
