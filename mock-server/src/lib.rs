use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::Response,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Echo of the request as the server saw it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub json: Option<serde_json::Value>,
}

impl Echo {
    pub fn header_count(&self, key: &str) -> usize {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .count()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Shared state; `hits` counts every request that reached the server.
#[derive(Clone, Debug, Default)]
pub struct MockState {
    hits: Arc<AtomicUsize>,
}

impl MockState {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn app() -> Router {
    app_with_state(MockState::default())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/get", get(echo))
        .route("/anything", any(echo))
        .route("/anything/{*rest}", any(echo))
        .route("/status/{code}", any(status))
        .route("/delay/{millis}", any(delay))
        .route("/bearer", get(bearer))
        .route("/auth/refresh", post(refresh))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, MockState::default()).await
}

pub async fn serve(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

async fn count_hits(State(state): State<MockState>, request: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(method = %request.method(), uri = %request.uri(), "mock request");
    next.run(request).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let json = serde_json::from_str(&body).ok();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body,
        json,
    })
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {}", status.as_u16()))
}

async fn delay(Path(millis): Path<u64>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Json(serde_json::json!({ "delayed_ms": millis }))
}

async fn bearer(headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or((StatusCode::UNAUTHORIZED, "unauthorized".to_string()))?;
    Ok(Json(serde_json::json!({ "authenticated": true, "token": token })))
}

async fn refresh(headers: HeaderMap) -> Result<Json<Tokens>, (StatusCode, String)> {
    let presented = headers
        .get("x-refresh-token")
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty());
    if presented.is_none() {
        return Err((StatusCode::UNAUTHORIZED, "missing refresh token".to_string()));
    }
    Ok(Json(Tokens {
        access_token: Uuid::new_v4().to_string(),
        refresh_token: Uuid::new_v4().to_string(),
    }))
}
