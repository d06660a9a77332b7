//! Credential and TLS resolution for a repository.
//!
//! Credentials are resolved by trying each source in [`CREDENTIAL_SOURCES`]
//! in order; the first source that yields credentials wins. When none does,
//! the request goes out anonymously.

use crate::config::PoetryConfig;
use crate::types::{CaBundle, Credentials, StoredCertificates, TlsMaterial, TOKEN_USERNAME};
use std::path::PathBuf;
use tracing::debug;

/// Stored credentials and certificate settings, keyed by repository.
pub trait Authenticator {
    fn pypi_token(&self, repository: &str) -> Option<String>;
    fn http_auth(&self, repository: &str) -> Option<Credentials>;
    fn certs_for_repository(&self, repository: &str) -> StoredCertificates;
}

impl Authenticator for PoetryConfig {
    fn pypi_token(&self, repository: &str) -> Option<String> {
        PoetryConfig::pypi_token(self, repository)
    }

    fn http_auth(&self, repository: &str) -> Option<Credentials> {
        self.http_basic(repository)
    }

    fn certs_for_repository(&self, repository: &str) -> StoredCertificates {
        self.certificates(repository)
    }
}

/// Values given on the command line; each overrides what is stored.
#[derive(Debug, Clone, Default)]
pub struct AuthOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
}

/// One step of the credential lookup.
pub type CredentialSource = fn(&AuthOverrides, &str, &dyn Authenticator) -> Option<Credentials>;

/// Credential sources in precedence order.
pub const CREDENTIAL_SOURCES: &[(&str, CredentialSource)] = &[
    ("explicit", explicit_credentials),
    ("token", token_credentials),
    ("http-basic", stored_credentials),
];

/// Username and password given together on the command line.
pub fn explicit_credentials(
    overrides: &AuthOverrides,
    _repository: &str,
    _auth: &dyn Authenticator,
) -> Option<Credentials> {
    match (&overrides.username, &overrides.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Some(Credentials::new(username.clone(), password.clone()))
        }
        _ => None,
    }
}

/// API token stored for the repository.
pub fn token_credentials(
    _overrides: &AuthOverrides,
    repository: &str,
    auth: &dyn Authenticator,
) -> Option<Credentials> {
    let token = auth.pypi_token(repository)?;
    debug!("Found an API token for {}.", repository);
    Some(Credentials::new(TOKEN_USERNAME, token))
}

/// HTTP basic credentials stored for the repository.
pub fn stored_credentials(
    _overrides: &AuthOverrides,
    repository: &str,
    auth: &dyn Authenticator,
) -> Option<Credentials> {
    let credentials = auth.http_auth(repository)?;
    debug!("Found authentication information for {}.", repository);
    Some(credentials)
}

/// First source yielding credentials, with its name.
pub fn first_credentials(
    overrides: &AuthOverrides,
    repository: &str,
    auth: &dyn Authenticator,
) -> Option<(&'static str, Credentials)> {
    CREDENTIAL_SOURCES
        .iter()
        .find_map(|&(name, source)| Some((name, source(overrides, repository, auth)?)))
}

/// Resolve the credentials for one check.
///
/// A partial override (username without password) is kept when no source
/// yields anything.
pub fn resolve_credentials(
    overrides: &AuthOverrides,
    repository: &str,
    auth: &dyn Authenticator,
) -> Credentials {
    first_credentials(overrides, repository, auth)
        .map(|(name, credentials)| {
            debug!("Using {} credentials for {}", name, repository);
            credentials
        })
        .unwrap_or_else(|| {
            debug!("No credentials found for {}, sending anonymous request", repository);
            Credentials {
                username: overrides.username.clone(),
                password: overrides.password.clone(),
            }
        })
}

/// Resolve the CA bundle and client certificate for one check.
pub fn resolve_tls(
    overrides: &AuthOverrides,
    repository: &str,
    auth: &dyn Authenticator,
) -> TlsMaterial {
    let stored = auth.certs_for_repository(repository);

    let ca_bundle = match (&overrides.cert, stored.cert, stored.verify) {
        (Some(path), _, _) => CaBundle::Path(path.clone()),
        (None, Some(path), _) => CaBundle::Path(path),
        (None, None, Some(verify)) => CaBundle::Verify(verify),
        (None, None, None) => CaBundle::default(),
    };

    TlsMaterial {
        ca_bundle,
        client_cert: overrides.client_cert.clone().or(stored.client_cert),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeAuthenticator {
        token: Option<String>,
        basic: Option<Credentials>,
        certs: StoredCertificates,
    }

    impl Authenticator for FakeAuthenticator {
        fn pypi_token(&self, _repository: &str) -> Option<String> {
            self.token.clone()
        }

        fn http_auth(&self, _repository: &str) -> Option<Credentials> {
            self.basic.clone()
        }

        fn certs_for_repository(&self, _repository: &str) -> StoredCertificates {
            self.certs.clone()
        }
    }

    fn everything_stored() -> FakeAuthenticator {
        FakeAuthenticator {
            token: Some("pypi-token".to_string()),
            basic: Some(Credentials::new("stored", "stored-pass")),
            certs: StoredCertificates {
                cert: Some(PathBuf::from("/stored/ca.pem")),
                verify: Some(false),
                client_cert: Some(PathBuf::from("/stored/client.pem")),
            },
        }
    }

    #[test]
    fn test_explicit_credentials_win() {
        let overrides = AuthOverrides {
            username: Some("me".to_string()),
            password: Some("mine".to_string()),
            ..Default::default()
        };

        let creds = resolve_credentials(&overrides, "foo", &everything_stored());
        assert_eq!(creds, Credentials::new("me", "mine"));
    }

    #[test]
    fn test_token_before_basic_auth() {
        let creds = resolve_credentials(&AuthOverrides::default(), "foo", &everything_stored());
        assert_eq!(creds, Credentials::new("__token__", "pypi-token"));
    }

    #[test]
    fn test_basic_auth_without_token() {
        let auth = FakeAuthenticator {
            basic: Some(Credentials::new("stored", "stored-pass")),
            ..Default::default()
        };

        let creds = resolve_credentials(&AuthOverrides::default(), "foo", &auth);
        assert_eq!(creds, Credentials::new("stored", "stored-pass"));
    }

    #[test]
    fn test_partial_override_falls_through() {
        let overrides = AuthOverrides {
            username: Some("me".to_string()),
            ..Default::default()
        };

        let creds = resolve_credentials(&overrides, "foo", &everything_stored());
        assert_eq!(creds, Credentials::new("__token__", "pypi-token"));

        let creds = resolve_credentials(&overrides, "foo", &FakeAuthenticator::default());
        assert_eq!(creds.username.as_deref(), Some("me"));
        assert!(creds.password.is_none());
    }

    #[test]
    fn test_first_credentials_names_the_source() {
        let explicit = AuthOverrides {
            username: Some("me".to_string()),
            password: Some("mine".to_string()),
            ..Default::default()
        };
        let basic_only = FakeAuthenticator {
            basic: Some(Credentials::new("stored", "stored-pass")),
            ..Default::default()
        };

        let hit = |overrides: &AuthOverrides, auth: &dyn Authenticator| {
            first_credentials(overrides, "foo", auth).map(|(name, _)| name)
        };
        assert_eq!(hit(&explicit, &everything_stored()), Some("explicit"));
        assert_eq!(hit(&AuthOverrides::default(), &everything_stored()), Some("token"));
        assert_eq!(hit(&AuthOverrides::default(), &basic_only), Some("http-basic"));
        assert_eq!(hit(&AuthOverrides::default(), &FakeAuthenticator::default()), None);
    }

    #[test]
    fn test_anonymous_when_nothing_found() {
        let creds =
            resolve_credentials(&AuthOverrides::default(), "foo", &FakeAuthenticator::default());
        assert!(creds.is_anonymous());
    }

    #[test]
    fn test_explicit_cert_wins() {
        let overrides = AuthOverrides {
            cert: Some(PathBuf::from("/explicit/ca.pem")),
            client_cert: Some(PathBuf::from("/explicit/client.pem")),
            ..Default::default()
        };

        let tls = resolve_tls(&overrides, "foo", &everything_stored());
        assert_eq!(tls.ca_bundle, CaBundle::Path(PathBuf::from("/explicit/ca.pem")));
        assert_eq!(tls.client_cert, Some(PathBuf::from("/explicit/client.pem")));
    }

    #[test]
    fn test_stored_cert_before_verify_flag() {
        let tls = resolve_tls(&AuthOverrides::default(), "foo", &everything_stored());
        assert_eq!(tls.ca_bundle, CaBundle::Path(PathBuf::from("/stored/ca.pem")));
        assert_eq!(tls.client_cert, Some(PathBuf::from("/stored/client.pem")));
    }

    #[test]
    fn test_verify_flag_and_default() {
        let auth = FakeAuthenticator {
            certs: StoredCertificates {
                verify: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let tls = resolve_tls(&AuthOverrides::default(), "foo", &auth);
        assert_eq!(tls.ca_bundle, CaBundle::Verify(false));

        let tls = resolve_tls(&AuthOverrides::default(), "foo", &FakeAuthenticator::default());
        assert_eq!(tls, TlsMaterial::default());
    }
}
