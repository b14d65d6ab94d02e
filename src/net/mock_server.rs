//! In-process backend for exercising the client over real HTTP.
//!
//! Accounts: `a@b.com` / `pw` logs in with token `t1`. `notoken@b.com` logs in
//! without a token. `numeric@b.com` / `pw` gets a numeric user id plus an extra
//! `role` field. Password `html` gets a 500 with an HTML body. Anything else
//! is a 401 `{"message":"bad creds"}`. Chat routes require `Bearer t1`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::api::ApiClient;
use crate::config::ClientConfig;
use crate::storage::MemoryStorage;

pub const GOOD_TOKEN: &str = "t1";
const GOOD_BEARER: &str = "Bearer t1";

/// Method, path and body of a request the backend received.
#[derive(Clone, Debug)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    async fn record(&self, method: Method, path: &str, headers: &HeaderMap, body: &Value) {
        self.seen.lock().await.push(Seen {
            method,
            path: path.to_owned(),
            headers: headers.clone(),
            body: body.clone(),
        });
    }
}

pub struct MockServer {
    pub base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockServer {
    pub async fn spawn() -> Self {
        let backend = Backend::default();
        let seen = backend.seen.clone();
        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/chat/session", post(create_session))
            .route("/api/chat/{session_id}/message", post(send_message))
            .route("/api/echo", any(echo))
            .route("/api/teapot", any(teapot))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url: format!("http://{addr}"), seen }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).unwrap()
    }

    /// Client backed by fresh memory storage, returned alongside it.
    pub fn client(&self) -> (ApiClient, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let client = ApiClient::new(self.config(), storage.clone()).unwrap();
        (client, storage)
    }

    pub async fn seen(&self) -> Vec<Seen> {
        self.seen.lock().await.clone()
    }

    pub async fn last(&self) -> Seen {
        self.seen().await.pop().unwrap()
    }
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or(Value::Null)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(GOOD_BEARER)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()
}

async fn register(State(backend): State<Backend>, headers: HeaderMap, body: String) -> Response {
    let body = parse(&body);
    backend.record(Method::POST, "/api/auth/register", &headers, &body).await;
    if body["email"] == "taken@b.com" {
        return (StatusCode::CONFLICT, Json(json!({ "message": "Email already registered" }))).into_response();
    }
    if !body["email"].as_str().is_some_and(|e| e.contains('@')) {
        let invalid = json!({ "statusCode": 400, "message": ["email must be an email"], "error": "Bad Request" });
        return (StatusCode::BAD_REQUEST, Json(invalid)).into_response();
    }
    (StatusCode::CREATED, Json(json!({ "message": "User registered", "userId": "2" }))).into_response()
}

async fn login(State(backend): State<Backend>, headers: HeaderMap, body: String) -> Response {
    let body = parse(&body);
    backend.record(Method::POST, "/api/auth/login", &headers, &body).await;
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    let user = json!({ "id": "1", "username": "alice", "email": email });
    match (email.as_str(), body["password"].as_str()) {
        ("a@b.com", Some("pw")) => Json(json!({ "token": GOOD_TOKEN, "user": user })).into_response(),
        ("numeric@b.com", Some("pw")) => Json(json!({
            "token": GOOD_TOKEN,
            "user": { "id": 7, "username": "neo", "email": email, "role": "admin" }
        }))
        .into_response(),
        ("notoken@b.com", Some("pw")) => Json(json!({ "user": user })).into_response(),
        (_, Some("html")) => {
            (StatusCode::INTERNAL_SERVER_ERROR, [(header::CONTENT_TYPE, "text/html")], "<html>boom</html>")
                .into_response()
        }
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad creds" }))).into_response(),
    }
}

async fn create_session(State(backend): State<Backend>, headers: HeaderMap, body: String) -> Response {
    let body = parse(&body);
    backend.record(Method::POST, "/api/chat/session", &headers, &body).await;
    if !authorized(&headers) {
        return unauthorized();
    }
    let session_id = uuid::Uuid::new_v4().to_string();
    Json(json!({ "sessionId": session_id, "userId": body["userId"] })).into_response()
}

async fn send_message(
    State(backend): State<Backend>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let body = parse(&body);
    let path = format!("/api/chat/{session_id}/message");
    backend.record(Method::POST, &path, &headers, &body).await;
    if !authorized(&headers) {
        return unauthorized();
    }
    let message = body["message"].as_str().unwrap_or_default();
    Json(json!({ "response": format!("echo: {message}") })).into_response()
}

/// Reflects the request so header and body handling can be asserted.
async fn echo(State(backend): State<Backend>, method: Method, headers: HeaderMap, body: String) -> Response {
    let parsed = parse(&body);
    backend.record(method.clone(), "/api/echo", &headers, &parsed).await;
    let header_map: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_owned(), json!(v.to_str().unwrap_or_default())))
        .collect();
    Json(json!({ "method": method.as_str(), "headers": header_map, "body": parsed })).into_response()
}

async fn teapot() -> Response {
    (StatusCode::IM_A_TEAPOT, Json(json!({ "error": "short and stout" }))).into_response()
}
