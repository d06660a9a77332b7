//! Repository and lookup URL resolution.

use crate::config::PoetryConfig;
use crate::types::{
    CheckExistingError, RepositoryTarget, Result, DEFAULT_INDEX_URL, DEFAULT_REPOSITORY,
};
use url::Url;

/// Source of configured repository base URLs.
pub trait RepositoryUrls {
    fn repository_url(&self, name: &str) -> Option<String>;
}

impl RepositoryUrls for PoetryConfig {
    fn repository_url(&self, name: &str) -> Option<String> {
        PoetryConfig::repository_url(self, name)
    }
}

impl RepositoryUrls for std::collections::HashMap<String, String> {
    fn repository_url(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolve a repository name to its identifier and base URL.
///
/// No name (or an empty one) selects the public index.
pub fn resolve_target<R>(repository: Option<&str>, repos: &R) -> Result<RepositoryTarget>
where
    R: RepositoryUrls + ?Sized,
{
    match repository.filter(|name| !name.is_empty()) {
        None => Ok(RepositoryTarget {
            name: DEFAULT_REPOSITORY.to_string(),
            base_url: DEFAULT_INDEX_URL.to_string(),
        }),
        Some(name) => {
            let base_url = repos
                .repository_url(name)
                .ok_or_else(|| CheckExistingError::RepositoryUndefined(name.to_string()))?;
            Ok(RepositoryTarget {
                name: name.to_string(),
                base_url,
            })
        }
    }
}

/// JSON metadata URL of `package` under the target's base URL.
pub fn release_url(target: &RepositoryTarget, package: &str) -> Result<Url> {
    let mut base = target.base_url.clone();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base)?;
    Ok(base.join(&format!("{}/json", package))?)
}

/// Resolve the repository and the lookup URL in one step.
pub fn resolve_url<R>(
    repository: Option<&str>,
    package: &str,
    repos: &R,
) -> Result<(RepositoryTarget, Url)>
where
    R: RepositoryUrls + ?Sized,
{
    let target = resolve_target(repository, repos)?;
    let url = release_url(&target, package)?;
    Ok((target, url))
}
