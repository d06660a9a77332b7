//! Core types and errors for the existing-version check.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Identifier used for the public package index.
pub const DEFAULT_REPOSITORY: &str = "pypi";

/// Lookup base of the public package index.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi/";

/// Username paired with an API token.
pub const TOKEN_USERNAME: &str = "__token__";

/// Errors that can occur while checking for an existing version.
#[derive(Error, Debug)]
pub enum CheckExistingError {
    #[error("Repository {0} is not defined")]
    RepositoryUndefined(String),

    #[error("HTTP request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),

    #[error("Package version {version} already exists in {repository}")]
    VersionExists { version: String, repository: String },

    #[error("Project error: {0}")]
    ProjectError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CheckExistingError {
    /// True for failures of the release lookup itself (transport or status).
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::HttpStatus { .. } | Self::HttpError(_))
    }
}

pub type Result<T> = std::result::Result<T, CheckExistingError>;

/// Name and version of the project being published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    /// Canonical package name.
    pub name: String,
    /// Version text as declared in the manifest.
    pub version: String,
}

/// The index a check runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    /// Repository identifier, `pypi` for the public index.
    pub name: String,
    /// Base lookup URL of the index.
    pub base_url: String,
}

/// Effective username and password for one check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// No credentials; the request is sent anonymously.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

/// Server certificate verification setting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CaBundle {
    /// Verify against the CA bundle at this path.
    Path(PathBuf),
    /// Verify against the platform roots (`true`) or not at all (`false`).
    Verify(bool),
}

impl Default for CaBundle {
    fn default() -> Self {
        Self::Verify(true)
    }
}

/// TLS settings for one check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsMaterial {
    pub ca_bundle: CaBundle,
    /// PEM file holding the client certificate and its private key.
    pub client_cert: Option<PathBuf>,
}

/// Certificate settings stored for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCertificates {
    pub cert: Option<PathBuf>,
    pub verify: Option<bool>,
    pub client_cert: Option<PathBuf>,
}

/// Versions already published for a package, in index order.
pub type ReleaseSet = Vec<String>;
