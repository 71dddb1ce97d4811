//! Test utilities and common setup.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use dirserver::{routes, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

/// Create a served tree:
///
/// ```text
/// a.txt        (4 bytes)
/// b.bin        (1536 bytes)
/// c/x.txt
/// c/y.txt
/// c/deep/z.txt
/// ```
pub fn sample_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::write(root.join("a.txt"), "aaaa").unwrap();
    std::fs::write(root.join("b.bin"), vec![7u8; 1536]).unwrap();
    std::fs::create_dir_all(root.join("c/deep")).unwrap();
    std::fs::write(root.join("c/x.txt"), "x").unwrap();
    std::fs::write(root.join("c/y.txt"), "y").unwrap();
    std::fs::write(root.join("c/deep/z.txt"), "z").unwrap();
    temp_dir
}

/// State serving `dir` with JSON listings and no auth.
pub fn test_state(dir: &TempDir) -> AppState {
    AppState::new(dir.path().canonicalize().unwrap())
}

pub fn test_app(state: AppState) -> Router {
    routes::app(state)
}

pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// Issue a GET, optionally with an Authorization header.
pub async fn get(app: Router, uri: &str, authorization: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri).method(Method::GET);
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }

    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
