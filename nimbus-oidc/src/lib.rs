//! OIDC client authentication for nimbus applications.
//!
//! Registers the services a host OIDC client needs, builds the signed-in
//! principal (reconciling issuer and role claims with the access token) and
//! can resolve tenant-specific settings before setup.
//!
//! # Example
//!
//! ```ignore
//! use nimbus_core::ClientAppBuilder;
//! use nimbus_oidc::prelude::*;
//!
//! let mut builder = ClientAppBuilder::load("dev")?;
//! builder
//!     .add_oidc_auth(
//!         |o| {
//!             o.authority = "https://idp.example/realms/acme".into();
//!             o.client_id = "acme-web".into();
//!         },
//!         OidcAuthOptions::new().role_claim_type("groups"),
//!     )
//!     .add_access_token_provider(host_tokens)
//!     .add_session_monitoring()
//!     .add_application_user::<AppUser, AppUserLoader>();
//! let app = builder.build();
//!
//! let factory = app.services().get::<OidcClaimsPrincipalFactory>()?;
//! let principal = factory.create_user(Some(&account)).await;
//! ```

pub mod app_user;
pub mod builder;
pub mod enrichment;
pub mod error;
pub mod factory;
pub mod hooks;
pub mod hosting;
pub mod options;
pub mod session;
pub mod tenant;

pub use app_user::{
    ApplicationUser, ApplicationUserHook, ApplicationUserLoader, ApplicationUserProcessor,
    ApplicationUserState, SharedApplicationUserLoader,
};
pub use builder::OidcAuthenticationBuilder;
pub use enrichment::{enrich_identity, map_issuer, map_roles};
pub use error::{ApplicationUserError, EnrichmentError, HookError, TenantConfigError};
pub use factory::{OidcClaimsPrincipalFactory, RemoteUserAccount};
pub use hooks::{
    AuthenticationPostProcessor, ClaimsExtender, SharedClaimsExtender, SharedPostProcessor,
};
pub use hosting::OidcHostingExt;
pub use options::{
    OidcAuthOptions, OidcProviderOptions, RemoteAuthenticationOptions,
    RemoteAuthenticationUserOptions,
};
pub use session::SessionOptions;
pub use tenant::{
    resolve_tenant_config, EnvTenantConfig, LoadedTenantConfig, StaticTenantConfig,
    TenantAuthConfig, TenantConfigLoader, TenantConfigSource,
};

pub mod prelude {
    //! Re-exports of the types needed to set up OIDC authentication.
    pub use crate::{
        ApplicationUser, ApplicationUserLoader, AuthenticationPostProcessor, ClaimsExtender,
        OidcAuthOptions, OidcClaimsPrincipalFactory, OidcHostingExt, RemoteUserAccount,
        SessionOptions, TenantConfigSource,
    };
}
