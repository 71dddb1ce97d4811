use axum::{
    extract::{Query, State},
    response::{Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::FileServerError;
use crate::listing::{self, ItemType};
use crate::path;
use crate::render;
use crate::AppState;

/// Query parameters for the listing endpoint
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Path relative to root (empty for the root itself)
    #[serde(default)]
    pub path: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub root: String,
}

/// GET /health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        root: state.root_dir.display().to_string(),
    })
}

/// GET / - Send browsers to the listing page
pub async fn index() -> Redirect {
    Redirect::temporary("/files.html")
}

/// GET /files.html - List a directory or download a file
///
/// Directories are rendered through the configured renderer; a file target is
/// streamed back as an attachment.
pub async fn get_listing(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, FileServerError> {
    // Rejects escapes before anything touches the disk.
    let resolved = path::resolve(&state.root_dir, &query.path)?;

    debug!(
        "Listing path: {}, count_files: {}",
        resolved.display(),
        state.count_files
    );

    let root = state.root_dir.clone();
    let count_files = state.count_files;
    // Names shown to the client come from the requested path, not from
    // wherever a symlink inside the tree points.
    let (target, listing) = tokio::task::spawn_blocking(move || {
        path::verify_within_root(&root, &resolved)?;
        let listing = listing::list(&resolved, count_files)?;
        Ok::<_, FileServerError>((resolved, listing))
    })
    .await
    .map_err(|err| FileServerError::Walk(std::io::Error::other(err.to_string())))?
    .inspect_err(|err| {
        if matches!(err, FileServerError::Walk(_)) {
            error!("Listing {:?} failed: {}", query.path, err);
        }
    })?;

    match listing.root().map(|item| item.item_type()) {
        None => Err(FileServerError::NotFound(query.path)),
        Some(ItemType::File) => render::file_attachment(&target).await,
        Some(ItemType::Directory) => state.renderer.render(&listing),
    }
}
