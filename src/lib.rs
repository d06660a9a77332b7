//! poetry-check-existing - Checks whether a project version is already published.
//!
//! Before publishing, this library:
//! - Reads the project name and version from `pyproject.toml`
//! - Resolves the target index URL and credentials from Poetry configuration
//! - Lists the versions already published (JSON API or Artifactory storage API)
//! - Fails if the current version is among them
//!
//! # Example
//!
//! ```no_run
//! use poetry_check_existing::checker::{CheckRequest, ExistenceChecker};
//! use poetry_check_existing::config::PoetryConfig;
//! use poetry_check_existing::project::Project;
//! use poetry_check_existing::registry::HttpSessionFactory;
//!
//! #[tokio::main]
//! async fn main() {
//!     let project = Project::from_dir(".").unwrap();
//!     let config = PoetryConfig::load(project.root()).unwrap();
//!     let checker =
//!         ExistenceChecker::new(project.identity(), &config, &config, HttpSessionFactory);
//!     let releases = checker.check_existing(&CheckRequest::default()).await.unwrap();
//!     println!("{} releases published", releases.len());
//! }
//! ```

pub mod auth;
pub mod checker;
pub mod config;
pub mod notify;
pub mod project;
pub mod registry;
pub mod resolver;
pub mod types;

pub use checker::{CheckRequest, ExistenceChecker};
pub use config::{CheckConfig, Commands, Config, PoetryConfig};
pub use project::Project;
pub use types::{
    CaBundle, CheckExistingError, Credentials, ProjectIdentity, ReleaseSet, RepositoryTarget,
    Result, TlsMaterial,
};
