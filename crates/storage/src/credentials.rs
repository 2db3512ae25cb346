//! Session-scoped storage credentials

use std::fmt;
use std::future::Future;

use crate::error::{Result, StorageError};

/// Short-lived credentials issued for the current user session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl SessionCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Supplies credentials for the active session.
///
/// Called once per upload. Implementations own refresh and caching.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> impl Future<Output = Result<SessionCredentials>> + Send;
}

/// A provider that always returns the same credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials(SessionCredentials);

impl StaticCredentials {
    pub fn new(credentials: SessionCredentials) -> Self {
        Self(credentials)
    }

    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
    /// `AWS_SESSION_TOKEN` from the environment.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| StorageError::Credentials(format!("{name} not set")))
        };
        Ok(Self(SessionCredentials::new(
            var("AWS_ACCESS_KEY_ID")?,
            var("AWS_SECRET_ACCESS_KEY")?,
            std::env::var("AWS_SESSION_TOKEN").ok(),
        )))
    }
}

impl CredentialProvider for StaticCredentials {
    async fn credentials(&self) -> Result<SessionCredentials> {
        Ok(self.0.clone())
    }
}
