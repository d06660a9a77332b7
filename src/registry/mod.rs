//! Release lookup module.
//!
//! Lists the versions already published for a package, either through the
//! index's JSON API or through the Artifactory storage API.

pub mod artifactory;
pub mod index;
pub mod session;

pub use artifactory::{artifactory_base_url, ArtifactoryClient};
pub use session::{HttpSession, HttpSessionFactory, Session, SessionFactory};

use crate::types::{ReleaseSet, RepositoryTarget, Result};
use url::Url;

/// Strategy used to list published versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReleaseSource {
    /// `<index>/<package>/json`
    #[default]
    Index,
    /// Artifactory storage API folder listing.
    Artifactory,
}

impl ReleaseSource {
    pub fn from_flag(artifactory: bool) -> Self {
        if artifactory {
            Self::Artifactory
        } else {
            Self::Index
        }
    }

    /// List the versions published for `package` at `target`.
    pub async fn fetch_releases<S: Session>(
        &self,
        session: &S,
        target: &RepositoryTarget,
        url: &Url,
        package: &str,
    ) -> Result<ReleaseSet> {
        match self {
            Self::Index => index::fetch_releases(session, url).await,
            Self::Artifactory => {
                ArtifactoryClient::new(session, url)?
                    .get_releases(&target.name, package)
                    .await
            }
        }
    }
}
