use tracing::info;

use crate::config::{AppConfig, ConfigError};
use crate::registry::{ServiceProvider, ServiceRegistry};

/// Builder for assembling a client application.
///
/// Holds the loaded [`AppConfig`] and the [`ServiceRegistry`] that setup
/// extensions (such as the OIDC hosting extensions) register into. Call
/// [`build`](Self::build) once setup is complete.
///
/// # Example
///
/// ```ignore
/// let mut builder = ClientAppBuilder::load("dev")?;
/// builder.add_oidc_auth(|o| o.authority = "https://idp.example".into(), OidcAuthOptions::new());
/// let app = builder.build();
/// ```
#[derive(Debug, Default)]
pub struct ClientAppBuilder {
    config: AppConfig,
    services: ServiceRegistry,
}

impl ClientAppBuilder {
    /// Create a builder with an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with the given configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            services: ServiceRegistry::new(),
        }
    }

    /// Load configuration for `profile` and create a builder around it.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Ok(Self::with_config(AppConfig::load(profile)?))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut ServiceRegistry {
        &mut self.services
    }

    /// Finish setup. The configuration is registered as a singleton so
    /// factories can read it.
    pub fn build(self) -> ClientApp {
        let Self {
            config,
            mut services,
        } = self;
        services.try_add_singleton(config.clone());
        info!(
            profile = %config.profile(),
            registrations = services.len(),
            "Client application built"
        );
        ClientApp {
            config,
            services: services.build(),
        }
    }
}

/// A fully configured client application.
#[derive(Debug, Clone)]
pub struct ClientApp {
    config: AppConfig,
    services: ServiceProvider,
}

impl ClientApp {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn services(&self) -> &ServiceProvider {
        &self.services
    }
}
