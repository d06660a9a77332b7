//! Release lookup through an index's JSON API.

use crate::registry::session::Session;
use crate::types::{CheckExistingError, ReleaseSet, Result};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Fetch `<package>/json` and return the published versions.
pub async fn fetch_releases<S: Session>(session: &S, url: &Url) -> Result<ReleaseSet> {
    let document = session.get_json(url).await?;
    let releases = releases_from_document(&document)?;
    debug!("Index lists {} releases at {}", releases.len(), url);
    Ok(releases)
}

/// Keys of the `releases` mapping, in document order.
pub fn releases_from_document(document: &Value) -> Result<ReleaseSet> {
    let releases = document.get("releases").ok_or_else(|| {
        CheckExistingError::ResponseShape("missing \"releases\" field".to_string())
    })?;

    let releases = releases.as_object().ok_or_else(|| {
        CheckExistingError::ResponseShape("\"releases\" is not a mapping".to_string())
    })?;

    Ok(releases.keys().cloned().collect())
}
