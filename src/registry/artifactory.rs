//! Release lookup through the Artifactory storage API.
//!
//! Artifactory lays a PyPI repository out as one folder per version under
//! `<repository>/<package>`, so listing that folder's children yields the
//! published versions.

use crate::registry::session::Session;
use crate::types::{ReleaseSet, Result};
use serde::Deserialize;
use tracing::debug;
use url::Url;

const BASE_PATH: &str = "/artifactory";

/// Storage API folder listing.
#[derive(Debug, Deserialize)]
struct FolderListing {
    #[serde(default)]
    files: Vec<ListedItem>,
}

#[derive(Debug, Deserialize)]
struct ListedItem {
    uri: String,
}

/// Base endpoint of the Artifactory instance serving `url`.
///
/// Any path, query or fragment is replaced, so
/// `https://example.com/artifactory/api/pypi/local/pkg` becomes
/// `https://example.com/artifactory`.
pub fn artifactory_base_url(url: &str) -> Result<String> {
    let mut parsed = Url::parse(url)?;
    parsed.set_path(BASE_PATH);
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Artifactory client listing versions through a session.
pub struct ArtifactoryClient<'a, S> {
    session: &'a S,
    base_url: String,
}

impl<'a, S: Session> ArtifactoryClient<'a, S> {
    /// Create a client for the instance serving `url`.
    pub fn new(session: &'a S, url: &Url) -> Result<Self> {
        Ok(Self {
            session,
            base_url: artifactory_base_url(url.as_str())?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Immediate children of `path`, folders included.
    fn list_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/storage/{}", self.base_url, path))?;
        url.set_query(Some("list&deep=0&listFolders=1"));
        Ok(url)
    }

    /// Versions uploaded for `package_name`, in the order Artifactory lists them.
    pub async fn get_releases(&self, repository_name: &str, package_name: &str) -> Result<ReleaseSet> {
        let url = self.list_url(&format!("{}/{}", repository_name, package_name))?;
        let document = self.session.get_json(&url).await?;
        let listing: FolderListing = serde_json::from_value(document)?;

        let releases: ReleaseSet = listing
            .files
            .into_iter()
            .map(|item| item.uri.trim_start_matches('/').to_string())
            .collect();

        debug!("Artifactory lists {} releases for {}", releases.len(), package_name);
        Ok(releases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckExistingError;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    #[test]
    fn test_base_url_drops_deeper_path() {
        assert_eq!(
            artifactory_base_url("https://example.com/artifactory/api/pypi/local/pkg").unwrap(),
            "https://example.com/artifactory"
        );
        assert_eq!(
            artifactory_base_url("https://example.com/").unwrap(),
            "https://example.com/artifactory"
        );
        assert_eq!(
            artifactory_base_url("https://example.com:8443/foo/bar/?q=1#frag").unwrap(),
            "https://example.com:8443/artifactory"
        );
    }

    #[test]
    fn test_base_url_is_idempotent() {
        for input in [
            "https://example.com",
            "https://example.com/artifactory/",
            "https://artifactory.example.com/artifactory/api/pypi/pypi-artifactory/version-two-project-name/json",
        ] {
            let once = artifactory_base_url(input).unwrap();
            let twice = artifactory_base_url(&once).unwrap();
            assert_eq!(once, twice);
            assert!(once.ends_with("/artifactory"));
        }
    }

    #[test]
    fn test_base_url_invalid() {
        let err = artifactory_base_url("not a url").unwrap_err();
        assert!(matches!(err, CheckExistingError::UrlError(_)));
    }

    struct ListingSession {
        document: Value,
        requested: RefCell<Vec<String>>,
    }

    impl Session for ListingSession {
        async fn get_json(&self, url: &Url) -> Result<Value> {
            self.requested.borrow_mut().push(url.to_string());
            Ok(self.document.clone())
        }

        fn close(self) {}
    }

    #[tokio::test]
    async fn test_get_releases_preserves_order() {
        let session = ListingSession {
            document: json!({
                "repo": "pypi-local",
                "path": "/version-two-project-name",
                "files": [
                    {"uri": "/0.1.0", "folder": true},
                    {"uri": "/0.1.1", "folder": true},
                    {"uri": "/0.1.2", "folder": true},
                    {"uri": "/2.0.1", "folder": true}
                ]
            }),
            requested: RefCell::new(Vec::new()),
        };
        let url = Url::parse(
            "https://artifactory.example.com/artifactory/api/pypi/pypi-local/version-two-project-name/json",
        )
        .unwrap();

        let client = ArtifactoryClient::new(&session, &url).unwrap();
        assert_eq!(client.base_url(), "https://artifactory.example.com/artifactory");

        let releases = client
            .get_releases("pypi-local", "version-two-project-name")
            .await
            .unwrap();

        assert_eq!(releases, vec!["0.1.0", "0.1.1", "0.1.2", "2.0.1"]);
        assert_eq!(
            session.requested.borrow().as_slice(),
            ["https://artifactory.example.com/artifactory/api/storage/pypi-local/version-two-project-name?list&deep=0&listFolders=1"]
        );
    }

    #[tokio::test]
    async fn test_get_releases_bad_listing() {
        let session = ListingSession {
            document: json!({"files": [{"size": 10}]}),
            requested: RefCell::new(Vec::new()),
        };
        let url = Url::parse("https://example.com/").unwrap();

        let client = ArtifactoryClient::new(&session, &url).unwrap();
        let err = client.get_releases("repo", "pkg").await.unwrap_err();
        assert!(matches!(err, CheckExistingError::JsonError(_)));
    }
}
