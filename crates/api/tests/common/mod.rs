#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use notekernel_api::auth::jwt::{generate_access_token, JwtConfig};
use notekernel_api::config::ServerConfig;
use notekernel_api::router::build_app_router;
use notekernel_api::routes;
use notekernel_api::state::AppState;
use notekernel_core::roles::Role;

/// Build a test `ServerConfig` rooted in `root`.
///
/// Uses `http://localhost:6806` as CORS origin, a fixed signing secret and a
/// 30-second request timeout.
pub fn test_config(root: &Path, access_auth_code: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:6806".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_body_bytes: 1024 * 1024,
        read_only: false,
        access_auth_code: access_auth_code.map(str::to_string),
        workspace_dir: root.join("workspace"),
        log_dir: root.join("logs"),
        temp_dir: root.join("temp"),
        latest_version: None,
        font_dirs: vec![root.join("fonts")],
        changelog_path: None,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// A kernel wired exactly like production, backed by a temporary directory.
pub struct TestKernel {
    pub app: Router,
    pub state: AppState,
    pub root: TempDir,
}

/// Build the full application router with the real route table.
pub fn build_test_kernel(access_auth_code: Option<&str>) -> TestKernel {
    build_test_kernel_with(access_auth_code, |_| {})
}

/// Like [`build_test_kernel`] but lets the caller tweak the config first.
pub fn build_test_kernel_with(
    access_auth_code: Option<&str>,
    tweak: impl FnOnce(&mut ServerConfig),
) -> TestKernel {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path(), access_auth_code);
    tweak(&mut config);
    std::fs::create_dir_all(&config.workspace_dir).unwrap();

    let table = routes::api_routes().expect("route table should build");
    let state = AppState::new(config.clone(), table).unwrap();
    let app = build_app_router(state.clone(), &config);

    TestKernel { app, state, root }
}

/// Mint a token for `role` signed with the kernel's secret.
pub fn token_for(state: &AppState, role: Role) -> String {
    generate_access_token("tester", role, state.sessions.generation(), &state.config.jwt).unwrap()
}

/// Send a request and return status, headers and the parsed JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}

/// POST a JSON body to a kernel endpoint.
pub async fn post_json(
    app: &Router,
    path: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let (status, _, json) = send(app, Method::POST, path, token, Some(body)).await;
    (status, json)
}

/// POST with no body.
pub async fn post_empty(
    app: &Router,
    path: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let (status, _, json) = send(app, Method::POST, path, token, None).await;
    (status, json)
}
