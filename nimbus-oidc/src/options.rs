use nimbus_core::{AppConfig, ConfigError};
use nimbus_security::{AuthorizationOptions, ClaimTypes};
use serde::{Deserialize, Serialize};

use crate::hooks::{ClaimsExtender, SharedClaimsExtender};

/// Response type requested when none is configured.
pub const DEFAULT_RESPONSE_TYPE: &str = "code";

/// Authentication type stamped on identities built from a signed-in account.
pub const DEFAULT_AUTHENTICATION_TYPE: &str = "oidc";

/// Settings handed to the host OIDC client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcProviderOptions {
    /// Issuer base URL of the identity provider.
    pub authority: String,
    pub client_id: String,
    /// OAuth 2.0 response type (default: `code`).
    pub response_type: String,
    pub response_mode: Option<String>,
    /// Scopes requested on sign-in (default: `openid`, `profile`).
    pub default_scopes: Vec<String>,
    pub redirect_uri: Option<String>,
    pub post_logout_redirect_uri: Option<String>,
    /// Explicit discovery document URL, when it differs from the authority's.
    pub metadata_url: Option<String>,
}

impl Default for OidcProviderOptions {
    fn default() -> Self {
        Self {
            authority: String::new(),
            client_id: String::new(),
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
            response_mode: None,
            default_scopes: vec!["openid".to_string(), "profile".to_string()],
            redirect_uri: None,
            post_logout_redirect_uri: None,
            metadata_url: None,
        }
    }
}

impl OidcProviderOptions {
    /// Add a scope unless it is already requested.
    pub fn add_scope(&mut self, scope: impl Into<String>) {
        let scope = scope.into();
        if !self.default_scopes.contains(&scope) {
            self.default_scopes.push(scope);
        }
    }

    /// Bind provider options from the configuration section `prefix`.
    ///
    /// Reads `{prefix}.authority` and `{prefix}.client_id` (required) and
    /// `response_type`, `response_mode`, `scopes`, `redirect_uri`,
    /// `post_logout_redirect_uri`, `metadata_url` (optional). Scopes are added
    /// to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if a required key is missing, or
    /// `ConfigError::TypeMismatch` if a value has the wrong type.
    pub fn from_config(config: &AppConfig, prefix: &str) -> Result<Self, ConfigError> {
        let key = |name: &str| format!("{prefix}.{name}");
        let mut options = Self {
            authority: config.get(&key("authority"))?,
            client_id: config.get(&key("client_id"))?,
            response_mode: config.get_optional(&key("response_mode"))?,
            redirect_uri: config.get_optional(&key("redirect_uri"))?,
            post_logout_redirect_uri: config.get_optional(&key("post_logout_redirect_uri"))?,
            metadata_url: config.get_optional(&key("metadata_url"))?,
            ..Self::default()
        };
        if let Some(response_type) = config.get_optional::<String>(&key("response_type"))? {
            options.response_type = response_type;
        }
        for scope in config
            .get_optional::<Vec<String>>(&key("scopes"))?
            .unwrap_or_default()
        {
            options.add_scope(scope);
        }
        Ok(options)
    }
}

/// How the host maps account claims onto an identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAuthenticationUserOptions {
    /// Claim type holding the display name (default: `name`).
    pub name_claim: String,
    /// Claim type holding roles (default: `roles`).
    pub role_claim: String,
    pub authentication_type: String,
}

impl Default for RemoteAuthenticationUserOptions {
    fn default() -> Self {
        Self {
            name_claim: ClaimTypes::NAME.to_string(),
            role_claim: ClaimTypes::ROLES.to_string(),
            authentication_type: DEFAULT_AUTHENTICATION_TYPE.to_string(),
        }
    }
}

/// Everything the host authentication subsystem needs, registered as one singleton.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAuthenticationOptions {
    pub provider_options: OidcProviderOptions,
    pub user_options: RemoteAuthenticationUserOptions,
}

type AuthorizationCallback = Box<dyn FnOnce(&mut AuthorizationOptions) + Send>;

/// Named parameters for the OIDC setup entry points.
///
/// # Example
///
/// ```ignore
/// let options = OidcAuthOptions::new()
///     .role_claim_type("groups")
///     .authorization(|a| {
///         a.add_policy("Auditors", AuthorizationPolicy::with_any_role(["auditor"]));
///     })
///     .claims_extender(TenantClaimsExtender);
/// ```
pub struct OidcAuthOptions {
    pub(crate) role_claim_type: String,
    pub(crate) name_claim_type: String,
    pub(crate) authorization: Option<AuthorizationCallback>,
    pub(crate) claims_extenders: Vec<SharedClaimsExtender>,
}

impl Default for OidcAuthOptions {
    fn default() -> Self {
        Self {
            role_claim_type: ClaimTypes::ROLES.to_string(),
            name_claim_type: ClaimTypes::NAME.to_string(),
            authorization: None,
            claims_extenders: Vec::new(),
        }
    }
}

impl std::fmt::Debug for OidcAuthOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcAuthOptions")
            .field("role_claim_type", &self.role_claim_type)
            .field("name_claim_type", &self.name_claim_type)
            .field("authorization", &self.authorization.is_some())
            .field("claims_extenders", &self.claims_extenders.len())
            .finish()
    }
}

impl OidcAuthOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim type holding roles (default: `roles`).
    pub fn role_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.role_claim_type = claim_type.into();
        self
    }

    /// Claim type holding the display name (default: `name`).
    pub fn name_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.name_claim_type = claim_type.into();
        self
    }

    /// Customize authorization policies after the standard ones are installed.
    pub fn authorization<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut AuthorizationOptions) + Send + 'static,
    {
        self.authorization = Some(Box::new(configure));
        self
    }

    /// Register a claims extender. Extenders run in the order they are added.
    pub fn claims_extender(mut self, extender: impl ClaimsExtender) -> Self {
        self.claims_extenders.push(SharedClaimsExtender::new(extender));
        self
    }
}
