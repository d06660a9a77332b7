//! Existing-version check orchestrating resolution, lookup and decision.

use crate::auth::{resolve_credentials, resolve_tls, AuthOverrides, Authenticator};
use crate::config::CheckConfig;
use crate::registry::{ReleaseSource, Session, SessionFactory};
use crate::resolver::{resolve_url, RepositoryUrls};
use crate::types::{CheckExistingError, ProjectIdentity, ReleaseSet, RepositoryTarget, Result};
use tracing::{debug, error};
use url::Url;

/// Inputs of one check.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    /// Repository name; `None` selects the public index.
    pub repository: Option<String>,
    pub source: ReleaseSource,
    pub overrides: AuthOverrides,
}

impl From<&CheckConfig> for CheckRequest {
    fn from(config: &CheckConfig) -> Self {
        Self {
            repository: config.repository.clone(),
            source: ReleaseSource::from_flag(config.artifactory),
            overrides: AuthOverrides {
                username: config.username.clone(),
                password: config.password.clone(),
                cert: config.cert.clone(),
                client_cert: config.client_cert.clone(),
            },
        }
    }
}

/// Checks that a project version has not been published yet.
pub struct ExistenceChecker<'a, F> {
    project: &'a ProjectIdentity,
    repositories: &'a dyn RepositoryUrls,
    authenticator: &'a dyn Authenticator,
    sessions: F,
}

impl<'a, F: SessionFactory> ExistenceChecker<'a, F> {
    pub fn new(
        project: &'a ProjectIdentity,
        repositories: &'a dyn RepositoryUrls,
        authenticator: &'a dyn Authenticator,
        sessions: F,
    ) -> Self {
        Self {
            project,
            repositories,
            authenticator,
            sessions,
        }
    }

    /// Run the check.
    ///
    /// Returns the published versions when the project version is not among
    /// them. Every failure is logged before it is returned.
    pub async fn check_existing(&self, request: &CheckRequest) -> Result<ReleaseSet> {
        let result = self.run(request).await;
        if let Err(ref e) = result {
            error!(
                package = %self.project.name,
                version = %self.project.version,
                "Error while checking existing package version: {}",
                e
            );
        }
        result
    }

    async fn run(&self, request: &CheckRequest) -> Result<ReleaseSet> {
        let (target, url) = resolve_url(
            request.repository.as_deref(),
            &self.project.name,
            self.repositories,
        )?;
        debug!("Checking {} at {} ({})", self.project.name, target.name, url);

        let credentials = resolve_credentials(&request.overrides, &target.name, self.authenticator);
        let tls = resolve_tls(&request.overrides, &target.name, self.authenticator);

        let session = self.sessions.open(&credentials, &tls)?;
        let outcome = self
            .fetch_and_decide(&session, request.source, &target, &url)
            .await;
        session.close();

        outcome
    }

    async fn fetch_and_decide<S: Session>(
        &self,
        session: &S,
        source: ReleaseSource,
        target: &RepositoryTarget,
        url: &Url,
    ) -> Result<ReleaseSet> {
        let releases = source
            .fetch_releases(session, target, url, &self.project.name)
            .await?;

        if releases.iter().any(|r| *r == self.project.version) {
            return Err(CheckExistingError::VersionExists {
                version: self.project.version.clone(),
                repository: target.name.clone(),
            });
        }

        Ok(releases)
    }
}
