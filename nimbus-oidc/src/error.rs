use nimbus_security::{AccessTokenError, SecurityError};

/// Why claims enrichment was abandoned for a sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    /// The host could not hand out an access token.
    TokenUnavailable(AccessTokenError),
    /// The access token could not be decoded.
    InvalidToken(SecurityError),
    /// Neither the identity nor the access token carries an `iss` claim.
    MissingIssuer,
}

impl std::fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentError::TokenUnavailable(e) => write!(f, "Access token failure: {e}"),
            EnrichmentError::InvalidToken(e) => write!(f, "Access token error: {e}"),
            EnrichmentError::MissingIssuer => write!(f, "Issuer claim is missing or invalid."),
        }
    }
}

impl std::error::Error for EnrichmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnrichmentError::TokenUnavailable(e) => Some(e),
            EnrichmentError::InvalidToken(e) => Some(e),
            EnrichmentError::MissingIssuer => None,
        }
    }
}

impl From<AccessTokenError> for EnrichmentError {
    fn from(err: AccessTokenError) -> Self {
        EnrichmentError::TokenUnavailable(err)
    }
}

impl From<SecurityError> for EnrichmentError {
    fn from(err: SecurityError) -> Self {
        EnrichmentError::InvalidToken(err)
    }
}

/// Fatal errors while resolving tenant-scoped OIDC settings at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantConfigError {
    /// The source holds no tenant configuration.
    NotFound,
    /// `authority` is missing or empty.
    MissingAuthority,
    /// `clientId` is missing or empty.
    MissingClientId,
    /// No tenant could be derived from the location URL.
    InvalidLocation(String),
    /// The tenant configuration document could not be fetched or parsed.
    Fetch { url: String, message: String },
}

impl std::fmt::Display for TenantConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantConfigError::NotFound => write!(
                f,
                "Tenant auth configuration not found. Ensure a tenant configuration source \
                 is set up and the auth configuration endpoint is reachable."
            ),
            TenantConfigError::MissingAuthority => write!(
                f,
                "Tenant auth configuration is missing the required OIDC authority."
            ),
            TenantConfigError::MissingClientId => write!(
                f,
                "Tenant auth configuration is missing the required client id."
            ),
            TenantConfigError::InvalidLocation(msg) => {
                write!(f, "Cannot resolve tenant from location: {msg}")
            }
            TenantConfigError::Fetch { url, message } => {
                write!(f, "Failed to load tenant auth configuration from {url}: {message}")
            }
        }
    }
}

impl std::error::Error for TenantConfigError {}

/// Failure to load the application user for a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationUserError {
    /// The principal lacks a claim the loader needs.
    MissingClaim(String),
    /// The backing store failed.
    Load(String),
}

impl std::fmt::Display for ApplicationUserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationUserError::MissingClaim(claim) => {
                write!(f, "Cannot load application user: missing claim '{claim}'")
            }
            ApplicationUserError::Load(msg) => write!(f, "Failed to load application user: {msg}"),
        }
    }
}

impl std::error::Error for ApplicationUserError {}

/// Error reported by a claims extender or post-processor.
///
/// Hook errors are logged by the claims pipeline and never fail sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for HookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HookError {}

impl From<ApplicationUserError> for HookError {
    fn from(err: ApplicationUserError) -> Self {
        HookError::new(err.to_string())
    }
}
