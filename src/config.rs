//! Command-line surface and Poetry configuration loading.

use crate::types::{CaBundle, CheckExistingError, Credentials, Result, StoredCertificates};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Checks whether a project version already exists in a package index.
#[derive(Parser, Debug, Clone)]
#[command(name = "poetry-check-existing")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Checks if the package version already exists in the pypi index
    CheckExisting(CheckConfig),
}

/// Configuration for the check-existing command.
#[derive(Parser, Debug, Clone, Default)]
pub struct CheckConfig {
    /// The directory containing the pyproject.toml with the package version
    pub directory: Option<PathBuf>,

    /// The repository to use
    #[arg(short, long)]
    pub repository: Option<String>,

    /// Whether to query the Artifactory storage API instead of the JSON API
    #[arg(short = 'A', long)]
    pub artifactory: bool,

    /// The username to use
    #[arg(short, long)]
    pub username: Option<String>,

    /// The password to use
    #[arg(short, long)]
    pub password: Option<String>,

    /// The path to a CA bundle to use
    #[arg(short, long)]
    pub cert: Option<PathBuf>,

    /// The path to a client certificate to use
    #[arg(short = 'C', long)]
    pub client_cert: Option<PathBuf>,
}

impl CheckConfig {
    /// Project directory, falling back to the working directory.
    pub fn project_dir(&self) -> Result<PathBuf> {
        match self.directory {
            Some(ref dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

const ENV_PREFIX: &str = "POETRY_";
const CONFIG_DIR_ENV: &str = "POETRY_CONFIG_DIR";

/// One Poetry configuration file (`config.toml`, `auth.toml` or `poetry.toml`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigFile {
    #[serde(default)]
    repositories: HashMap<String, RepositoryEntry>,
    #[serde(default)]
    http_basic: HashMap<String, HttpBasicEntry>,
    #[serde(default)]
    pypi_token: HashMap<String, String>,
    #[serde(default)]
    certificates: HashMap<String, CertificateEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct RepositoryEntry {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpBasicEntry {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CertificateEntry {
    cert: Option<CaBundle>,
    client_cert: Option<PathBuf>,
}

impl ConfigFile {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a config file; a missing file is an empty layer.
    pub fn read(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!("No config file at {:?}", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Loaded config file {:?}", path);
        Self::parse(&content).map_err(|e| {
            CheckExistingError::ConfigError(format!("invalid {}: {}", path.display(), e))
        })
    }
}

/// Layered view of Poetry configuration.
///
/// Lookups consult the environment first, then the file layers in the order
/// they were given.
#[derive(Debug, Default)]
pub struct PoetryConfig {
    env: HashMap<String, String>,
    layers: Vec<ConfigFile>,
}

impl PoetryConfig {
    /// Build from an environment snapshot and file layers, highest priority first.
    pub fn new(env: HashMap<String, String>, layers: Vec<ConfigFile>) -> Self {
        Self { env, layers }
    }

    /// Load the environment, the project-local `poetry.toml` and the global
    /// `config.toml`/`auth.toml`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();

        let mut layers = vec![ConfigFile::read(&project_dir.join("poetry.toml"))?];

        if let Some(config_dir) = config_dir(&env) {
            layers.push(ConfigFile::read(&config_dir.join("config.toml"))?);
            layers.push(ConfigFile::read(&config_dir.join("auth.toml"))?);
        }

        Ok(Self::new(env, layers))
    }

    fn env_value(&self, parts: &[&str]) -> Option<&str> {
        let key = format!("{}{}", ENV_PREFIX, parts.join("_"));
        self.env
            .get(&key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// `repositories.<name>.url`
    pub fn repository_url(&self, name: &str) -> Option<String> {
        let env_name = env_key(name);
        if let Some(url) = self.env_value(&["REPOSITORIES", &env_name, "URL"]) {
            return Some(url.to_string());
        }

        self.layers
            .iter()
            .find_map(|l| l.repositories.get(name).and_then(|r| r.url.clone()))
    }

    /// `pypi-token.<name>`
    pub fn pypi_token(&self, name: &str) -> Option<String> {
        let env_name = env_key(name);
        if let Some(token) = self.env_value(&["PYPI_TOKEN", &env_name]) {
            return Some(token.to_string());
        }

        self.layers
            .iter()
            .find_map(|l| l.pypi_token.get(name).filter(|t| !t.is_empty()).cloned())
    }

    /// `http-basic.<name>`; only returned when a username is present.
    pub fn http_basic(&self, name: &str) -> Option<Credentials> {
        let env_name = env_key(name);
        if let Some(username) = self.env_value(&["HTTP_BASIC", &env_name, "USERNAME"]) {
            return Some(Credentials {
                username: Some(username.to_string()),
                password: self
                    .env_value(&["HTTP_BASIC", &env_name, "PASSWORD"])
                    .map(str::to_string),
            });
        }

        self.layers.iter().find_map(|l| {
            let entry = l.http_basic.get(name)?;
            let username = entry.username.clone()?;
            Some(Credentials {
                username: Some(username),
                password: entry.password.clone(),
            })
        })
    }

    /// `certificates.<name>`
    pub fn certificates(&self, name: &str) -> StoredCertificates {
        let env_name = env_key(name);
        let cert = self
            .env_value(&["CERTIFICATES", &env_name, "CERT"])
            .map(parse_ca_bundle)
            .or_else(|| {
                self.layers
                    .iter()
                    .find_map(|l| l.certificates.get(name).and_then(|c| c.cert.clone()))
            });
        let client_cert = self
            .env_value(&["CERTIFICATES", &env_name, "CLIENT_CERT"])
            .map(PathBuf::from)
            .or_else(|| {
                self.layers
                    .iter()
                    .find_map(|l| l.certificates.get(name).and_then(|c| c.client_cert.clone()))
            });

        let (cert, verify) = match cert {
            Some(CaBundle::Path(path)) => (Some(path), None),
            Some(CaBundle::Verify(flag)) => (None, Some(flag)),
            None => (None, None),
        };

        StoredCertificates {
            cert,
            verify,
            client_cert,
        }
    }
}

/// Global config directory: `$POETRY_CONFIG_DIR` or `<config dir>/pypoetry`.
fn config_dir(env: &HashMap<String, String>) -> Option<PathBuf> {
    if let Some(dir) = env.get(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join("pypoetry"))
}

/// Environment form of a repository name.
fn env_key(name: &str) -> String {
    name.to_uppercase().replace(['-', '.'], "_")
}

fn parse_ca_bundle(value: &str) -> CaBundle {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => CaBundle::Verify(true),
        "false" | "0" => CaBundle::Verify(false),
        _ => CaBundle::Path(PathBuf::from(value)),
    }
}
