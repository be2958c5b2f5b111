use nimbus_core::{ClientAppBuilder, ConfigError};
use nimbus_security::AuthorizationOptions;
use tracing::info;

use crate::builder::OidcAuthenticationBuilder;
use crate::error::TenantConfigError;
use crate::factory::OidcClaimsPrincipalFactory;
use crate::options::{
    OidcAuthOptions, OidcProviderOptions, RemoteAuthenticationOptions,
    RemoteAuthenticationUserOptions, DEFAULT_RESPONSE_TYPE,
};
use crate::tenant::{resolve_tenant_config, TenantConfigSource};

/// Configuration section read by [`OidcHostingExt::add_oidc_auth_from_config`].
pub const OIDC_CONFIG_SECTION: &str = "oidc";

/// OIDC setup entry points on [`ClientAppBuilder`].
pub trait OidcHostingExt {
    /// Register OIDC authentication, the claims-principal factory and
    /// authorization policies.
    ///
    /// Registration order: [`RemoteAuthenticationOptions`] (provider options
    /// after `configure`), claims extenders from `options`, the
    /// [`OidcClaimsPrincipalFactory`], then [`AuthorizationOptions`] with the
    /// standard policies followed by the `options` callback.
    fn add_oidc_auth<F>(&mut self, configure: F, options: OidcAuthOptions) -> OidcAuthenticationBuilder<'_>
    where
        F: FnOnce(&mut OidcProviderOptions);

    /// [`add_oidc_auth`](Self::add_oidc_auth) with provider options bound
    /// from the `oidc.*` configuration section.
    fn add_oidc_auth_from_config(
        &mut self,
        options: OidcAuthOptions,
    ) -> Result<OidcAuthenticationBuilder<'_>, ConfigError>;

    /// [`add_oidc_auth`](Self::add_oidc_auth) with tenant settings from
    /// `source`. Nothing is registered if the settings are missing or invalid.
    fn add_dynamic_auth(
        &mut self,
        source: &(impl TenantConfigSource + ?Sized),
        options: OidcAuthOptions,
    ) -> Result<OidcAuthenticationBuilder<'_>, TenantConfigError>;
}

impl OidcHostingExt for ClientAppBuilder {
    fn add_oidc_auth<F>(&mut self, configure: F, options: OidcAuthOptions) -> OidcAuthenticationBuilder<'_>
    where
        F: FnOnce(&mut OidcProviderOptions),
    {
        let OidcAuthOptions {
            role_claim_type,
            name_claim_type,
            authorization,
            claims_extenders,
        } = options;

        let mut provider_options = OidcProviderOptions::default();
        configure(&mut provider_options);
        if provider_options.response_type.trim().is_empty() {
            provider_options.response_type = DEFAULT_RESPONSE_TYPE.to_string();
        }

        info!(
            authority = %provider_options.authority,
            client_id = %provider_options.client_id,
            response_type = %provider_options.response_type,
            scopes = ?provider_options.default_scopes,
            "Configuring OIDC authentication"
        );

        let services = self.services_mut();
        services.replace_singleton(RemoteAuthenticationOptions {
            provider_options,
            user_options: RemoteAuthenticationUserOptions {
                name_claim: name_claim_type,
                role_claim: role_claim_type,
                ..RemoteAuthenticationUserOptions::default()
            },
        });
        for extender in claims_extenders {
            services.add_singleton(extender);
        }
        services.remove_all::<OidcClaimsPrincipalFactory>();
        services.add_factory(OidcClaimsPrincipalFactory::from_services);

        let mut authorization_options = AuthorizationOptions::with_default_policies();
        if let Some(configure_authorization) = authorization {
            configure_authorization(&mut authorization_options);
        }
        services.replace_singleton(authorization_options);

        OidcAuthenticationBuilder::new(self)
    }

    fn add_oidc_auth_from_config(
        &mut self,
        options: OidcAuthOptions,
    ) -> Result<OidcAuthenticationBuilder<'_>, ConfigError> {
        let provider_options = OidcProviderOptions::from_config(self.config(), OIDC_CONFIG_SECTION)?;
        Ok(self.add_oidc_auth(move |o| *o = provider_options, options))
    }

    fn add_dynamic_auth(
        &mut self,
        source: &(impl TenantConfigSource + ?Sized),
        options: OidcAuthOptions,
    ) -> Result<OidcAuthenticationBuilder<'_>, TenantConfigError> {
        let tenant = resolve_tenant_config(source)?;
        info!(authority = %tenant.authority, "Using tenant auth configuration");
        Ok(self.add_oidc_auth(move |o| tenant.apply_to(o), options))
    }
}
