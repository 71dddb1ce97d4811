//! HTTP Basic authentication against a single static credential pair.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, warn};

use crate::error::FileServerError;
use crate::AppState;

/// The one username/password pair allowed in.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check an `Authorization` header value.
    pub fn verify_header(&self, header_value: &str) -> bool {
        let Some((username, password)) = basic_credentials_from_header(header_value) else {
            return false;
        };

        // Evaluate both so timing does not reveal which half was wrong.
        let username_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let password_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        username_ok & password_ok
    }
}

/// Decode `Basic <base64(user:pass)>` into its two halves.
fn basic_credentials_from_header(header_value: &str) -> Option<(String, String)> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next()?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let encoded = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Basic auth middleware. Passes everything through when no credentials
/// are configured.
pub async fn basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, FileServerError> {
    let Some(credentials) = state.credentials.as_deref() else {
        return Ok(next.run(request).await);
    };

    let header_value = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match header_value {
        Some(value) if credentials.verify_header(value) => {
            debug!("Basic auth accepted for {}", request.uri().path());
            Ok(next.run(request).await)
        }
        Some(_) => {
            warn!("Rejected invalid credentials for {}", request.uri().path());
            Err(FileServerError::Unauthorized)
        }
        None => Err(FileServerError::Unauthorized),
    }
}
