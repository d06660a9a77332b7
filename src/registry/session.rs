//! HTTP session used for the release lookup.

use crate::types::{CaBundle, CheckExistingError, Credentials, Result, TlsMaterial};
use reqwest::header::ACCEPT;
use reqwest::{Certificate, Client, Identity};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, trace};
use url::Url;

/// A configured connection to an index, closed once the check is over.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// GET `url` expecting a JSON document. Any non-success status is an error.
    async fn get_json(&self, url: &Url) -> Result<Value>;

    /// Release the session.
    fn close(self);
}

/// Opens sessions from resolved credentials and TLS settings.
pub trait SessionFactory {
    type Session: Session;

    fn open(&self, credentials: &Credentials, tls: &TlsMaterial) -> Result<Self::Session>;
}

/// Session backed by a `reqwest` client.
pub struct HttpSession {
    client: Client,
    credentials: Credentials,
}

impl HttpSession {
    /// Create a new session.
    ///
    /// A CA bundle path replaces the built-in roots; `Verify(false)` turns
    /// certificate verification off.
    pub fn new(credentials: &Credentials, tls: &TlsMaterial) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("poetry-check-existing/", env!("CARGO_PKG_VERSION")));

        match tls.ca_bundle {
            CaBundle::Path(ref path) => {
                let pem = read_pem(path)?;
                let cert = Certificate::from_pem(&pem).map_err(|e| {
                    CheckExistingError::TlsError(format!("invalid CA bundle {}: {}", path.display(), e))
                })?;
                builder = builder
                    .tls_built_in_root_certs(false)
                    .add_root_certificate(cert);
            }
            CaBundle::Verify(false) => {
                debug!("TLS certificate verification disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
            CaBundle::Verify(true) => {}
        }

        if let Some(ref path) = tls.client_cert {
            let pem = read_pem(path)?;
            let identity = Identity::from_pem(&pem).map_err(|e| {
                CheckExistingError::TlsError(format!(
                    "invalid client certificate {}: {}",
                    path.display(),
                    e
                ))
            })?;
            builder = builder.identity(identity);
        }

        Ok(Self {
            client: builder.build()?,
            credentials: credentials.clone(),
        })
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        CheckExistingError::TlsError(format!("cannot read {}: {}", path.display(), e))
    })
}

impl Session for HttpSession {
    async fn get_json(&self, url: &Url) -> Result<Value> {
        trace!("GET {}", url);

        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json");

        // Basic auth is only sent with a complete pair.
        if let (Some(username), Some(password)) =
            (&self.credentials.username, &self.credentials.password)
        {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CheckExistingError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            CheckExistingError::ResponseShape(format!("response from {} is not JSON: {}", url, e))
        })
    }

    fn close(self) {
        trace!("Closing HTTP session");
        drop(self.client);
    }
}

/// Factory for [`HttpSession`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpSessionFactory;

impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    fn open(&self, credentials: &Credentials, tls: &TlsMaterial) -> Result<HttpSession> {
        HttpSession::new(credentials, tls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_open_default_session() {
        let session = HttpSessionFactory.open(&Credentials::anonymous(), &TlsMaterial::default());
        assert!(session.is_ok());
    }

    #[test]
    fn test_open_without_verification() {
        let tls = TlsMaterial {
            ca_bundle: CaBundle::Verify(false),
            client_cert: None,
        };
        assert!(HttpSession::new(&Credentials::new("u", "p"), &tls).is_ok());
    }

    #[test]
    fn test_missing_ca_bundle() {
        let tls = TlsMaterial {
            ca_bundle: CaBundle::Path(PathBuf::from("/nonexistent/ca-bundle.pem")),
            client_cert: None,
        };

        let err = HttpSession::new(&Credentials::anonymous(), &tls).err().unwrap();
        assert!(matches!(err, CheckExistingError::TlsError(ref m) if m.contains("ca-bundle.pem")));
    }

    #[test]
    fn test_missing_client_cert() {
        let tls = TlsMaterial {
            ca_bundle: CaBundle::Verify(true),
            client_cert: Some(PathBuf::from("/nonexistent/client.pem")),
        };

        let err = HttpSession::new(&Credentials::anonymous(), &tls).err().unwrap();
        assert!(matches!(err, CheckExistingError::TlsError(_)));
    }
}
