use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Credentials;
use crate::render::TemplateError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("root directory must be set")]
    MissingRoot,

    #[error("root directory does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("root path is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("basic auth needs both a username and a password")]
    IncompleteCredentials,

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory to serve
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Address to bind to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Report recursive file counts for subdirectories
    #[serde(default)]
    pub count_files: bool,

    /// Page template; listings are served as JSON when unset
    #[serde(default)]
    pub template: Option<PathBuf>,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Single static credential pair for basic auth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            bind: default_bind(),
            port: default_port(),
            count_files: false,
            template: None,
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Canonical root directory, checked to exist and be a directory.
    pub fn resolve_root(&self) -> Result<PathBuf, ConfigError> {
        let root = self.root.as_ref().ok_or(ConfigError::MissingRoot)?;
        let root = root
            .canonicalize()
            .map_err(|_| ConfigError::RootNotFound(root.clone()))?;

        if !root.is_dir() {
            return Err(ConfigError::RootNotDirectory(root));
        }

        Ok(root)
    }

    /// Basic auth credentials, if configured.
    pub fn credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        match (&self.auth.username, &self.auth.password) {
            (Some(username), Some(password)) => Ok(Some(Credentials::new(username, password))),
            (None, None) => Ok(None),
            _ => Err(ConfigError::IncompleteCredentials),
        }
    }
}
