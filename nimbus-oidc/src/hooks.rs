//! Pluggable stages of the claims pipeline.
//!
//! Both hook kinds are registered in the service registry behind their
//! `Shared*` handles and invoked in registration order.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use nimbus_security::{ClaimsIdentity, ClaimsPrincipal};

use crate::error::HookError;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Adds or transforms claims while the identity is being built.
///
/// # Example
///
/// ```ignore
/// struct GroupsAsRoles;
///
/// impl ClaimsExtender for GroupsAsRoles {
///     async fn extend_claims(&self, identity: &mut ClaimsIdentity) -> Result<(), HookError> {
///         let groups: Vec<String> = identity.find_all("groups").map(|c| c.value.clone()).collect();
///         let role_type = identity.role_claim_type().to_string();
///         identity.add_claims(groups.into_iter().map(|g| Claim::new(role_type.as_str(), g)));
///         Ok(())
///     }
/// }
/// ```
pub trait ClaimsExtender: Send + Sync + 'static {
    fn extend_claims(
        &self,
        identity: &mut ClaimsIdentity,
    ) -> impl Future<Output = Result<(), HookError>> + Send;
}

/// Runs once the principal is complete (e.g. to load application data).
pub trait AuthenticationPostProcessor: Send + Sync + 'static {
    fn process(&self, principal: &ClaimsPrincipal)
        -> impl Future<Output = Result<(), HookError>> + Send;
}

trait ClaimsExtenderErased: Send + Sync {
    fn extend_claims<'a>(
        &'a self,
        identity: &'a mut ClaimsIdentity,
    ) -> BoxFuture<'a, Result<(), HookError>>;

    fn name(&self) -> &'static str;
}

impl<T: ClaimsExtender> ClaimsExtenderErased for T {
    fn extend_claims<'a>(
        &'a self,
        identity: &'a mut ClaimsIdentity,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        Box::pin(ClaimsExtender::extend_claims(self, identity))
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

trait PostProcessorErased: Send + Sync {
    fn process<'a>(&'a self, principal: &'a ClaimsPrincipal) -> BoxFuture<'a, Result<(), HookError>>;

    fn name(&self) -> &'static str;
}

impl<T: AuthenticationPostProcessor> PostProcessorErased for T {
    fn process<'a>(&'a self, principal: &'a ClaimsPrincipal) -> BoxFuture<'a, Result<(), HookError>> {
        Box::pin(AuthenticationPostProcessor::process(self, principal))
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Cloneable handle to a [`ClaimsExtender`].
#[derive(Clone)]
pub struct SharedClaimsExtender(Arc<dyn ClaimsExtenderErased>);

impl SharedClaimsExtender {
    pub fn new(extender: impl ClaimsExtender) -> Self {
        Self(Arc::new(extender))
    }

    /// Type name of the wrapped extender, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub async fn extend_claims(&self, identity: &mut ClaimsIdentity) -> Result<(), HookError> {
        self.0.extend_claims(identity).await
    }
}

impl std::fmt::Debug for SharedClaimsExtender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedClaimsExtender").field(&self.name()).finish()
    }
}

/// Cloneable handle to an [`AuthenticationPostProcessor`].
#[derive(Clone)]
pub struct SharedPostProcessor(Arc<dyn PostProcessorErased>);

impl SharedPostProcessor {
    pub fn new(processor: impl AuthenticationPostProcessor) -> Self {
        Self(Arc::new(processor))
    }

    /// Type name of the wrapped post-processor, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub async fn process(&self, principal: &ClaimsPrincipal) -> Result<(), HookError> {
        self.0.process(principal).await
    }
}

impl std::fmt::Debug for SharedPostProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedPostProcessor").field(&self.name()).finish()
    }
}
