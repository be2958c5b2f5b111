//! Tenant-scoped OIDC settings resolved before authentication setup.

use nimbus_core::{AppConfig, ConfigError};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::TenantConfigError;
use crate::options::{OidcProviderOptions, DEFAULT_RESPONSE_TYPE};

/// Environment variable read by [`EnvTenantConfig::new`].
pub const DEFAULT_TENANT_CONFIG_VAR: &str = "NIMBUS_TENANT_AUTH_CONFIG";

/// Configuration key holding the tenant config URL template.
pub const TENANT_CONFIG_URL_KEY: &str = "nimbus.auth.tenant_config_url";

/// Placeholder replaced with the tenant slug in a config URL template.
pub const TENANT_PLACEHOLDER: &str = "{tenant}";

/// OIDC parameters published for one tenant.
///
/// Deserialized from camelCase JSON:
///
/// ```json
/// { "authority": "https://idp.example/realms/acme", "clientId": "acme-web",
///   "responseType": "code", "scopes": ["email"] }
/// ```
///
/// Missing and `null` fields read as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantAuthConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub authority: String,
    #[serde(deserialize_with = "null_as_default")]
    pub client_id: String,
    pub response_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub scopes: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TenantAuthConfig {
    pub fn new(authority: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Check the required fields. Whitespace-only values count as empty.
    pub fn validate(&self) -> Result<(), TenantConfigError> {
        if self.authority.trim().is_empty() {
            return Err(TenantConfigError::MissingAuthority);
        }
        if self.client_id.trim().is_empty() {
            return Err(TenantConfigError::MissingClientId);
        }
        Ok(())
    }

    /// Response type to request; `code` when unset or empty.
    pub fn effective_response_type(&self) -> &str {
        self.response_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_RESPONSE_TYPE)
    }

    /// Copy these settings onto provider options. Scopes are added to the
    /// ones already requested.
    pub fn apply_to(&self, options: &mut OidcProviderOptions) {
        options.authority = self.authority.clone();
        options.client_id = self.client_id.clone();
        options.response_type = self.effective_response_type().to_string();
        for scope in &self.scopes {
            options.add_scope(scope.as_str());
        }
    }
}

/// Where tenant settings come from.
pub trait TenantConfigSource {
    /// The tenant settings, or `None` if none are available.
    fn tenant_auth_config(&self) -> Option<TenantAuthConfig>;
}

/// Read and validate tenant settings from `source`.
pub fn resolve_tenant_config(
    source: &(impl TenantConfigSource + ?Sized),
) -> Result<TenantAuthConfig, TenantConfigError> {
    let config = source
        .tenant_auth_config()
        .ok_or(TenantConfigError::NotFound)?;
    config.validate()?;
    Ok(config)
}

/// Tenant settings supplied in code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticTenantConfig(Option<TenantAuthConfig>);

impl StaticTenantConfig {
    pub fn new(config: TenantAuthConfig) -> Self {
        Self(Some(config))
    }

    /// A source with nothing in it.
    pub fn missing() -> Self {
        Self(None)
    }
}

impl TenantConfigSource for StaticTenantConfig {
    fn tenant_auth_config(&self) -> Option<TenantAuthConfig> {
        self.0.clone()
    }
}

/// Tenant settings read as JSON from an environment variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvTenantConfig {
    var: String,
}

impl Default for EnvTenantConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvTenantConfig {
    /// Read from `NIMBUS_TENANT_AUTH_CONFIG`.
    pub fn new() -> Self {
        Self::from_var(DEFAULT_TENANT_CONFIG_VAR)
    }

    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl TenantConfigSource for EnvTenantConfig {
    fn tenant_auth_config(&self) -> Option<TenantAuthConfig> {
        let raw = std::env::var(&self.var).ok()?;
        match serde_json::from_str(&raw) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(var = %self.var, error = %e, "Ignoring malformed tenant auth configuration");
                None
            }
        }
    }
}

/// Tenant settings fetched for the current location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadedTenantConfig {
    pub tenant: Option<String>,
    pub config: Option<TenantAuthConfig>,
}

impl TenantConfigSource for LoadedTenantConfig {
    fn tenant_auth_config(&self) -> Option<TenantAuthConfig> {
        self.config.clone()
    }
}

/// Fetches tenant settings over HTTP.
///
/// The tenant is the first non-empty path segment of the page location
/// (`https://app.example/acme/orders` gives `acme`). It replaces `{tenant}`
/// in the URL template; a relative template resolves against the location.
#[derive(Clone, Debug)]
pub struct TenantConfigLoader {
    url_template: String,
    client: reqwest::Client,
}

impl TenantConfigLoader {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Build a loader from the `nimbus.auth.tenant_config_url` setting.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.get::<String>(TENANT_CONFIG_URL_KEY)?))
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Tenant slug for a page location.
    pub fn resolve_tenant(location: &str) -> Result<String, TenantConfigError> {
        let url = Url::parse(location)
            .map_err(|e| TenantConfigError::InvalidLocation(format!("{location}: {e}")))?;
        url.path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| {
                TenantConfigError::InvalidLocation(format!("{location}: no tenant path segment"))
            })
    }

    /// URL of the tenant config document for a page location.
    pub fn config_url(&self, location: &str) -> Result<Url, TenantConfigError> {
        let tenant = Self::resolve_tenant(location)?;
        let target = self.url_template.replace(TENANT_PLACEHOLDER, &tenant);
        Url::parse(location)
            .and_then(|base| base.join(&target))
            .map_err(|e| TenantConfigError::InvalidLocation(format!("{target}: {e}")))
    }

    /// Fetch the tenant settings for `location`.
    pub async fn load(&self, location: &str) -> Result<LoadedTenantConfig, TenantConfigError> {
        let tenant = Self::resolve_tenant(location)?;
        let url = self.config_url(location)?;
        debug!(%tenant, %url, "Fetching tenant auth configuration");

        let fetch_error = |message: String| TenantConfigError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| fetch_error(e.to_string()))?;

        let config: TenantAuthConfig = response
            .json()
            .await
            .map_err(|e| fetch_error(format!("invalid tenant configuration: {e}")))?;

        info!(%tenant, authority = %config.authority, "Loaded tenant auth configuration");
        Ok(LoadedTenantConfig {
            tenant: Some(tenant),
            config: Some(config),
        })
    }

    /// Like [`load`](Self::load), but failures are logged and yield an empty
    /// source, so setup reports [`TenantConfigError::NotFound`].
    pub async fn load_or_missing(&self, location: &str) -> LoadedTenantConfig {
        match self.load(location).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "Tenant auth configuration unavailable");
                LoadedTenantConfig {
                    tenant: Self::resolve_tenant(location).ok(),
                    config: None,
                }
            }
        }
    }
}
