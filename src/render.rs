//! Turning a listing into an HTTP response.

use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::error::FileServerError;
use crate::listing::{Item, Listing};

/// Context handed to templates and to the JSON encoder.
#[derive(Debug, Serialize)]
pub struct ListingResponse<'a> {
    pub root: &'a Item,
    pub items: &'a [Item],
}

impl<'a> ListingResponse<'a> {
    /// `None` for an empty listing.
    pub fn from_listing(listing: &'a Listing) -> Option<Self> {
        Some(Self {
            root: listing.root()?,
            items: listing.children(),
        })
    }
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid template {path}: {source}")]
    Parse {
        path: PathBuf,
        source: minijinja::Error,
    },
}

/// How directory listings are presented.
pub enum Renderer {
    Json,
    Template(PageTemplate),
}

/// A page template loaded once at startup.
pub struct PageTemplate {
    env: Environment<'static>,
    name: String,
}

impl PageTemplate {
    /// Load and compile a template file. Syntax errors surface here.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // The file name picks the auto-escape mode, so keep its extension.
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "listing.html".to_string());
        Self::from_source(name, source).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_source(name: String, source: String) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template_owned(name.clone(), source)?;
        Ok(Self { env, name })
    }

    pub fn render(&self, context: &ListingResponse<'_>) -> Result<String, minijinja::Error> {
        self.env.get_template(&self.name)?.render(context)
    }
}

impl Renderer {
    /// Template mode when a path is given, JSON otherwise.
    pub fn from_template_path(path: Option<&Path>) -> Result<Self, TemplateError> {
        match path {
            Some(path) => Ok(Renderer::Template(PageTemplate::from_file(path)?)),
            None => Ok(Renderer::Json),
        }
    }

    /// Render a directory listing. The body is produced in full before a
    /// status is chosen, so failures never leak a partial 200.
    pub fn render(&self, listing: &Listing) -> Result<Response, FileServerError> {
        let context = ListingResponse::from_listing(listing)
            .ok_or_else(|| FileServerError::Render("empty listing".to_string()))?;

        match self {
            Renderer::Json => {
                let body = serde_json::to_vec(&context).map_err(|e| {
                    error!("Failed to serialize listing: {}", e);
                    FileServerError::Render(e.to_string())
                })?;
                Ok((
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response())
            }
            Renderer::Template(template) => {
                let page = template.render(&context).map_err(|e| {
                    error!("Failed to render template {}: {}", template.name, e);
                    FileServerError::Render(e.to_string())
                })?;
                Ok(Html(page).into_response())
            }
        }
    }
}

/// Stream a single file as an attachment.
pub async fn file_attachment(path: &Path) -> Result<Response, FileServerError> {
    debug!("Streaming file: {}", path.display());

    let metadata = fs::metadata(path).await?;
    let file = fs::File::open(path).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    let safe_filename = file_name.replace('"', "'");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", safe_filename),
            ),
        ],
        body,
    )
        .into_response())
}
