use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileServerError {
    #[error("Path is outside root directory")]
    PathEscape,

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read directory tree: {0}")]
    Walk(#[from] std::io::Error),

    #[error("Failed to render listing: {0}")]
    Render(String),

    #[error("Authentication required")]
    Unauthorized,
}

impl From<walkdir::Error> for FileServerError {
    fn from(err: walkdir::Error) -> Self {
        FileServerError::Walk(err.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for FileServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            FileServerError::PathEscape => (StatusCode::BAD_REQUEST, "PATH_ESCAPE"),
            FileServerError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            FileServerError::Walk(_) => (StatusCode::INTERNAL_SERVER_ERROR, "WALK_FAILED"),
            FileServerError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_FAILED"),
            FileServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };

        if matches!(self, FileServerError::Unauthorized) {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"dirserver\"")],
                Json(body),
            )
                .into_response();
        }

        (status, Json(body)).into_response()
    }
}
