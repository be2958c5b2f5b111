//! Application user: domain data loaded for the signed-in principal.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use nimbus_security::ClaimsPrincipal;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{ApplicationUserError, HookError};
use crate::hooks::{AuthenticationPostProcessor, SharedPostProcessor};

/// Domain user associated with a signed-in principal.
pub trait ApplicationUser: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// Loads the application user for a principal.
///
/// Returning `Ok(None)` means the principal has no application account.
pub trait ApplicationUserLoader<U: ApplicationUser>: Send + Sync + 'static {
    fn load(
        &self,
        principal: &ClaimsPrincipal,
    ) -> impl Future<Output = Result<Option<U>, ApplicationUserError>> + Send;
}

type LoadFuture<'a, U> =
    Pin<Box<dyn Future<Output = Result<Option<U>, ApplicationUserError>> + Send + 'a>>;

trait ApplicationUserLoaderErased<U>: Send + Sync {
    fn load<'a>(&'a self, principal: &'a ClaimsPrincipal) -> LoadFuture<'a, U>;
}

impl<U: ApplicationUser, L: ApplicationUserLoader<U>> ApplicationUserLoaderErased<U> for L {
    fn load<'a>(&'a self, principal: &'a ClaimsPrincipal) -> LoadFuture<'a, U> {
        Box::pin(ApplicationUserLoader::load(self, principal))
    }
}

/// Cloneable handle to an [`ApplicationUserLoader`].
pub struct SharedApplicationUserLoader<U>(Arc<dyn ApplicationUserLoaderErased<U>>);

impl<U> Clone for SharedApplicationUserLoader<U> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<U> std::fmt::Debug for SharedApplicationUserLoader<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedApplicationUserLoader")
    }
}

impl<U: ApplicationUser> SharedApplicationUserLoader<U> {
    pub fn new(loader: impl ApplicationUserLoader<U>) -> Self {
        Self(Arc::new(loader))
    }

    pub async fn load(&self, principal: &ClaimsPrincipal) -> Result<Option<U>, ApplicationUserError> {
        self.0.load(principal).await
    }
}

/// Shared slot holding the current application user.
pub struct ApplicationUserState<U> {
    current: Arc<RwLock<Option<U>>>,
}

impl<U> Clone for ApplicationUserState<U> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<U> Default for ApplicationUserState<U> {
    fn default() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
        }
    }
}

impl<U> std::fmt::Debug for ApplicationUserState<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApplicationUserState")
    }
}

impl<U: ApplicationUser> ApplicationUserState<U> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<U> {
        self.current.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn set(&self, user: Option<U>) {
        *self.current.write().await = user;
    }

    pub async fn clear(&self) {
        self.set(None).await;
    }
}

/// Post-processor that loads the application user into its state after sign-in.
///
/// The state is cleared for anonymous principals and when loading fails.
pub struct ApplicationUserProcessor<U> {
    loader: SharedApplicationUserLoader<U>,
    state: ApplicationUserState<U>,
}

impl<U: ApplicationUser> ApplicationUserProcessor<U> {
    pub fn new(loader: SharedApplicationUserLoader<U>, state: ApplicationUserState<U>) -> Self {
        Self { loader, state }
    }

    async fn load_into_state(&self, principal: &ClaimsPrincipal) -> Result<(), HookError> {
        if !principal.is_authenticated() {
            debug!("Anonymous principal, clearing application user");
            self.state.clear().await;
            return Ok(());
        }

        match self.loader.load(principal).await {
            Ok(user) => {
                match &user {
                    Some(u) => info!(user_id = %u.id(), "Application user loaded"),
                    None => debug!("No application user for principal"),
                }
                self.state.set(user).await;
                Ok(())
            }
            Err(e) => {
                self.state.clear().await;
                Err(e.into())
            }
        }
    }
}

impl<U: ApplicationUser> AuthenticationPostProcessor for ApplicationUserProcessor<U> {
    fn process(
        &self,
        principal: &ClaimsPrincipal,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        self.load_into_state(principal)
    }
}

/// Registration slot for the application-user post-processor.
///
/// At most one is registered. The principal factory runs it after the
/// [`SharedPostProcessor`]s.
#[derive(Clone, Debug)]
pub struct ApplicationUserHook(SharedPostProcessor);

impl ApplicationUserHook {
    pub fn new<U: ApplicationUser>(processor: ApplicationUserProcessor<U>) -> Self {
        Self(SharedPostProcessor::new(processor))
    }

    pub fn processor(&self) -> &SharedPostProcessor {
        &self.0
    }

    pub fn into_processor(self) -> SharedPostProcessor {
        self.0
    }
}
