//! Project metadata read from `pyproject.toml`.

use crate::types::{CheckExistingError, ProjectIdentity, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const MANIFEST_FILE: &str = "pyproject.toml";

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    tool: ToolTable,
    project: Option<ProjectTable>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    poetry: Option<ProjectTable>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectTable {
    name: Option<String>,
    version: Option<String>,
}

/// A project directory and the identity declared in its manifest.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    identity: ProjectIdentity,
}

impl Project {
    /// Read the manifest in `dir` or the nearest ancestor holding one.
    ///
    /// The `[project]` table wins over `[tool.poetry]` field by field, so a
    /// manifest may declare the name in one and a dynamic version in the other.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let root = locate(dir)?;
        let manifest_path = root.join(MANIFEST_FILE);

        let content = std::fs::read_to_string(&manifest_path).map_err(|e| {
            CheckExistingError::ProjectError(format!(
                "cannot read {}: {}",
                manifest_path.display(),
                e
            ))
        })?;
        let identity = Self::parse_identity(&content)
            .map_err(|e| annotate(e, &manifest_path))?;

        debug!("Read project {}=={} from {:?}", identity.name, identity.version, manifest_path);

        Ok(Self { root, identity })
    }

    fn parse_identity(content: &str) -> Result<ProjectIdentity> {
        let manifest: Manifest = toml::from_str(content)?;
        let poetry = manifest.tool.poetry.unwrap_or_default();
        let pep621 = manifest.project.unwrap_or_default();

        let name = pep621
            .name
            .or(poetry.name)
            .ok_or_else(|| CheckExistingError::ProjectError("missing package name".to_string()))?;
        let version = pep621
            .version
            .or(poetry.version)
            .ok_or_else(|| {
                CheckExistingError::ProjectError("missing package version".to_string())
            })?;

        Ok(ProjectIdentity {
            name: canonicalize_name(&name),
            version,
        })
    }

    /// Canonical package name.
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Version text as declared.
    pub fn version(&self) -> &str {
        &self.identity.version
    }

    pub fn identity(&self) -> &ProjectIdentity {
        &self.identity
    }

    /// Directory holding the manifest.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Directory of the nearest `pyproject.toml`, starting at `dir`.
fn locate(dir: &Path) -> Result<PathBuf> {
    let dir = std::path::absolute(dir)?;
    dir.ancestors()
        .find(|d| d.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            CheckExistingError::ProjectError(format!(
                "cannot find {} in {} or its parents",
                MANIFEST_FILE,
                dir.display()
            ))
        })
}

fn annotate(err: CheckExistingError, path: &Path) -> CheckExistingError {
    match err {
        CheckExistingError::TomlError(e) => {
            CheckExistingError::ProjectError(format!("invalid {}: {}", path.display(), e))
        }
        CheckExistingError::ProjectError(msg) => {
            CheckExistingError::ProjectError(format!("{} in {}", msg, path.display()))
        }
        other => other,
    }
}

/// Normalize a package name per PEP 503.
/// - Lowercase
/// - Replace runs of [-_.] with a single -
pub fn canonicalize_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_separator = false;

    for c in name.trim().chars() {
        match c {
            '-' | '_' | '.' => {
                if !prev_separator {
                    result.push('-');
                    prev_separator = true;
                }
            }
            c => {
                result.push(c.to_ascii_lowercase());
                prev_separator = false;
            }
        }
    }

    result
}
