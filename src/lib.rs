//! Directory listing server.
//!
//! Serves a directory tree over HTTP: directories come back as a page or JSON
//! listing of their immediate entries, files are streamed as downloads. The
//! crate can be used as a standalone binary or the router embedded elsewhere.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod path;
pub mod render;
pub mod routes;
pub mod size;

use std::path::PathBuf;
use std::sync::Arc;

pub use auth::Credentials;
pub use config::{Config, ConfigError};
pub use error::FileServerError;
pub use listing::{list, Item, ItemKind, ItemType, Listing};
pub use render::Renderer;
pub use size::format_size;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Root directory to serve files from
    pub root_dir: PathBuf,
    /// Report recursive file counts for subdirectories
    pub count_files: bool,
    /// Directory listing presentation
    pub renderer: Arc<Renderer>,
    /// Basic auth credentials, if enabled
    pub credentials: Option<Arc<Credentials>>,
}

impl AppState {
    /// Create a new AppState serving JSON listings without auth.
    pub fn new(root_dir: PathBuf) -> Self {
        Self {
            root_dir,
            count_files: false,
            renderer: Arc::new(Renderer::Json),
            credentials: None,
        }
    }

    /// Build state from a loaded configuration.
    ///
    /// Validates the root, compiles the template and checks the credential
    /// pair, so misconfiguration fails at startup rather than per request.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let root_dir = config.resolve_root()?;
        let renderer = Renderer::from_template_path(config.template.as_deref())?;
        let credentials = config.credentials()?;

        Ok(Self {
            root_dir,
            count_files: config.count_files,
            renderer: Arc::new(renderer),
            credentials: credentials.map(Arc::new),
        })
    }

    pub fn with_count_files(mut self, count_files: bool) -> Self {
        self.count_files = count_files;
        self
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }
}
