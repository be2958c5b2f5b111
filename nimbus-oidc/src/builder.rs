use nimbus_core::{AppConfig, ClientAppBuilder, ServiceProvider, ServiceRegistry};
use nimbus_security::{AccessTokenProvider, SharedAccessTokenProvider};
use tracing::debug;

use crate::app_user::{
    ApplicationUser, ApplicationUserHook, ApplicationUserLoader, ApplicationUserProcessor,
    ApplicationUserState, SharedApplicationUserLoader,
};
use crate::hooks::{
    AuthenticationPostProcessor, ClaimsExtender, SharedClaimsExtender, SharedPostProcessor,
};
use crate::session::SessionOptions;

/// Chainable follow-up registrations after OIDC authentication is set up.
///
/// Returned by [`OidcHostingExt::add_oidc_auth`](crate::OidcHostingExt::add_oidc_auth)
/// and its variants.
///
/// ```ignore
/// builder
///     .add_oidc_auth(|o| o.authority = authority, OidcAuthOptions::new())
///     .add_session_monitoring()
///     .add_application_user::<AppUser, AppUserLoader>();
/// ```
pub struct OidcAuthenticationBuilder<'a> {
    app: &'a mut ClientAppBuilder,
}

impl<'a> OidcAuthenticationBuilder<'a> {
    pub(crate) fn new(app: &'a mut ClientAppBuilder) -> Self {
        Self { app }
    }

    pub fn config(&self) -> &AppConfig {
        self.app.config()
    }

    pub fn services(&mut self) -> &mut ServiceRegistry {
        self.app.services_mut()
    }

    /// Register [`SessionOptions`] with their defaults.
    pub fn add_session_monitoring(self) -> Self {
        self.add_session_monitoring_with(|_| {})
    }

    /// Register [`SessionOptions`]: defaults, then `configure`.
    pub fn add_session_monitoring_with<F>(self, configure: F) -> Self
    where
        F: FnOnce(&mut SessionOptions),
    {
        let mut options = SessionOptions::default();
        configure(&mut options);
        debug!(
            enabled = options.enabled,
            idle_timeout_secs = options.idle_timeout.as_secs(),
            "Registering session monitoring"
        );
        self.app.services_mut().replace_singleton(options);
        self
    }

    /// Register an application-user loader of type `L`, the shared
    /// [`ApplicationUserState<U>`] and the post-processor that fills it.
    pub fn add_application_user<U, L>(self) -> Self
    where
        U: ApplicationUser,
        L: ApplicationUserLoader<U> + Default,
    {
        self.add_application_user_with::<U, L, _>(|_| L::default())
    }

    /// Like [`add_application_user`](Self::add_application_user), with the
    /// loader built by `factory` from the final services.
    ///
    /// A later call replaces the earlier registration, so the loader runs
    /// once per sign-in.
    pub fn add_application_user_with<U, L, F>(self, factory: F) -> Self
    where
        U: ApplicationUser,
        L: ApplicationUserLoader<U>,
        F: Fn(&ServiceProvider) -> L + Send + Sync + 'static,
    {
        let state = ApplicationUserState::<U>::new();
        let services = self.app.services_mut();
        services.replace_singleton(state.clone());
        services.remove_all::<SharedApplicationUserLoader<U>>();
        services.add_factory(move |sp| Ok(SharedApplicationUserLoader::<U>::new(factory(sp))));

        // Built on resolution, once every service is registered.
        let replaced = services.remove_all::<ApplicationUserHook>();
        services.add_factory(move |sp| {
            let loader = sp.get::<SharedApplicationUserLoader<U>>()?;
            Ok(ApplicationUserHook::new(ApplicationUserProcessor::new(
                loader,
                state.clone(),
            )))
        });
        debug!(
            user_type = std::any::type_name::<U>(),
            replaced,
            "Registering application user"
        );
        self
    }

    /// Append a claims extender after the ones already registered.
    pub fn add_claims_extender(self, extender: impl ClaimsExtender) -> Self {
        self.app
            .services_mut()
            .add_singleton(SharedClaimsExtender::new(extender));
        self
    }

    /// Append a post-processor after the ones already registered.
    pub fn add_post_processor(self, processor: impl AuthenticationPostProcessor) -> Self {
        self.app
            .services_mut()
            .add_singleton(SharedPostProcessor::new(processor));
        self
    }

    /// Register the host access-token provider, replacing any previous one.
    pub fn add_access_token_provider(self, provider: impl AccessTokenProvider) -> Self {
        self.app
            .services_mut()
            .replace_singleton(SharedAccessTokenProvider::new(provider));
        self
    }
}
