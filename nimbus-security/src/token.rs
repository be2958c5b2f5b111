use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An access token handed out by the host token provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Raw bearer value.
    pub value: String,
    /// Expiry, if the provider reported one.
    pub expires: Option<DateTime<Utc>>,
    /// Scopes granted with this token.
    pub granted_scopes: Vec<String>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires", &self.expires)
            .field("granted_scopes", &self.granted_scopes)
            .finish()
    }
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires: None,
            granted_scopes: Vec::new(),
        }
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_granted_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.granted_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the token has expired at `now`. Tokens without expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|exp| exp <= now)
    }
}

/// Failure to obtain an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenError {
    /// No token is available without user interaction. `redirect_url` is
    /// where the host would send the user to obtain one.
    NotAvailable { redirect_url: Option<String> },

    /// The provider failed for another reason.
    Provider(String),
}

impl std::fmt::Display for AccessTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessTokenError::NotAvailable { redirect_url: Some(url) } => {
                write!(f, "Access token not available (interactive sign-in required at {url})")
            }
            AccessTokenError::NotAvailable { redirect_url: None } => {
                write!(f, "Access token not available")
            }
            AccessTokenError::Provider(msg) => write!(f, "Access token provider error: {msg}"),
        }
    }
}

impl std::error::Error for AccessTokenError {}

/// Host service that hands out access tokens.
///
/// Implement this trait to bridge the host authentication subsystem. Token
/// acquisition, caching and refresh all happen on the host side.
pub trait AccessTokenProvider: Send + Sync + 'static {
    fn request_access_token(
        &self,
    ) -> impl Future<Output = Result<AccessToken, AccessTokenError>> + Send;
}

/// Object-safe wrapper for `AccessTokenProvider`.
trait AccessTokenProviderErased: Send + Sync {
    fn request_access_token(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<AccessToken, AccessTokenError>> + Send + '_>>;
}

impl<T: AccessTokenProvider> AccessTokenProviderErased for T {
    fn request_access_token(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<AccessToken, AccessTokenError>> + Send + '_>> {
        Box::pin(AccessTokenProvider::request_access_token(self))
    }
}

/// Cloneable, type-erased handle to an [`AccessTokenProvider`], suitable for
/// registering in a service registry.
#[derive(Clone)]
pub struct SharedAccessTokenProvider(Arc<dyn AccessTokenProviderErased>);

impl std::fmt::Debug for SharedAccessTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedAccessTokenProvider")
    }
}

impl SharedAccessTokenProvider {
    pub fn new(provider: impl AccessTokenProvider) -> Self {
        Self(Arc::new(provider))
    }

    pub async fn request_access_token(&self) -> Result<AccessToken, AccessTokenError> {
        self.0.request_access_token().await
    }
}

/// Provider returning a fixed result. For development and testing.
#[derive(Debug, Clone)]
pub struct StaticAccessTokenProvider {
    result: Result<AccessToken, AccessTokenError>,
}

impl StaticAccessTokenProvider {
    /// Always hand out a token with the given raw value.
    pub fn token(value: impl Into<String>) -> Self {
        Self {
            result: Ok(AccessToken::new(value)),
        }
    }

    /// Always report that no token is available.
    pub fn unavailable() -> Self {
        Self {
            result: Err(AccessTokenError::NotAvailable { redirect_url: None }),
        }
    }

    /// Always fail with the given error.
    pub fn failing(error: AccessTokenError) -> Self {
        Self { result: Err(error) }
    }
}

impl AccessTokenProvider for StaticAccessTokenProvider {
    fn request_access_token(
        &self,
    ) -> impl Future<Output = Result<AccessToken, AccessTokenError>> + Send {
        std::future::ready(self.result.clone())
    }
}
