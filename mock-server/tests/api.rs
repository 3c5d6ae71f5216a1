use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, Echo, MockState, Tokens};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn get_echoes_headers() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/get")
                .header("x-client", "tests")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/get");
    assert_eq!(echo.header("X-Client"), Some("tests"));
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn anything_echoes_json_body() {
    let resp = app()
        .oneshot(json_request("POST", "/anything", r#"{"key":"value"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, r#"{"key":"value"}"#);
    assert_eq!(echo.json, Some(serde_json::json!({"key": "value"})));
    assert_eq!(echo.header_count("content-type"), 1);
}

#[tokio::test]
async fn anything_accepts_nested_paths_and_any_method() {
    let resp = app()
        .oneshot(json_request("PATCH", "/anything/users/42", "not json"))
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.path, "/anything/users/42");
    assert!(echo.json.is_none());
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code_with_body() {
    let resp = app().oneshot(empty_request("DELETE", "/status/404")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(&body_bytes(resp).await[..], b"status 404");
}

#[tokio::test]
async fn status_rejects_non_numeric_code() {
    let resp = app().oneshot(empty_request("GET", "/status/abc")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- delay ---

#[tokio::test]
async fn delay_responds_after_sleeping() {
    let resp = app().oneshot(empty_request("GET", "/delay/10")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["delayed_ms"], 10);
}

// --- auth ---

#[tokio::test]
async fn bearer_requires_prefixed_token() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/bearer")
                .header("authorization", "Bearer abc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["token"], "abc");

    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/bearer")
                .header("authorization", "abc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(&body_bytes(resp).await[..], b"unauthorized");
}

#[tokio::test]
async fn refresh_issues_new_tokens() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .header("x-refresh-token", "old")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let tokens: Tokens = body_json(resp).await;
    assert!(!tokens.access_token.is_empty());
    assert_ne!(tokens.access_token, tokens.refresh_token);
}

#[tokio::test]
async fn refresh_without_token_is_unauthorized() {
    let resp = app().oneshot(empty_request("POST", "/auth/refresh")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- hit counter ---

#[tokio::test]
async fn every_request_is_counted() {
    let state = MockState::default();
    let router = app_with_state(state.clone());

    router.clone().oneshot(empty_request("GET", "/get")).await.unwrap();
    router.oneshot(empty_request("GET", "/status/500")).await.unwrap();

    assert_eq!(state.hits(), 2);
}
