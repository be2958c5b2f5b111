use nimbus_core::{ServiceError, ServiceProvider};
use nimbus_security::claims::claims_from_json;
use nimbus_security::{
    ClaimsIdentity, ClaimsPrincipal, JsonWebToken, SharedAccessTokenProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::app_user::ApplicationUserHook;
use crate::enrichment::enrich_identity;
use crate::error::EnrichmentError;
use crate::hooks::{SharedClaimsExtender, SharedPostProcessor};
use crate::options::{RemoteAuthenticationOptions, RemoteAuthenticationUserOptions};

/// Profile claims returned by the host after sign-in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteUserAccount {
    claims: Map<String, Value>,
}

impl RemoteUserAccount {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// Raw claim object, in the order the host returned it.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Set a claim, replacing any previous value.
    pub fn insert(&mut self, claim_type: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.claims.insert(claim_type.into(), value.into());
        self
    }
}

impl From<Map<String, Value>> for RemoteUserAccount {
    fn from(claims: Map<String, Value>) -> Self {
        Self::new(claims)
    }
}

/// Builds the signed-in principal from the account claims and the access token.
///
/// Pipeline: identity from account claims, issuer/role enrichment from the
/// access token, claims extenders, then post-processors. Failures in any stage
/// after the identity is built are logged and never fail sign-in.
#[derive(Clone, Debug)]
pub struct OidcClaimsPrincipalFactory {
    token_provider: SharedAccessTokenProvider,
    user_options: RemoteAuthenticationUserOptions,
    claims_extenders: Vec<SharedClaimsExtender>,
    post_processors: Vec<SharedPostProcessor>,
}

impl OidcClaimsPrincipalFactory {
    pub fn new(
        token_provider: SharedAccessTokenProvider,
        user_options: RemoteAuthenticationUserOptions,
    ) -> Self {
        Self {
            token_provider,
            user_options,
            claims_extenders: Vec::new(),
            post_processors: Vec::new(),
        }
    }

    pub fn with_claims_extenders(
        mut self,
        extenders: impl IntoIterator<Item = SharedClaimsExtender>,
    ) -> Self {
        self.claims_extenders.extend(extenders);
        self
    }

    pub fn with_post_processors(
        mut self,
        processors: impl IntoIterator<Item = SharedPostProcessor>,
    ) -> Self {
        self.post_processors.extend(processors);
        self
    }

    /// Assemble the factory from registered services.
    ///
    /// Requires a [`SharedAccessTokenProvider`]. User options default when
    /// [`RemoteAuthenticationOptions`] is not registered; hooks are taken in
    /// registration order, with the [`ApplicationUserHook`] last.
    pub fn from_services(services: &ServiceProvider) -> Result<Self, ServiceError> {
        let token_provider = services.get::<SharedAccessTokenProvider>()?;
        let user_options = services
            .get_optional::<RemoteAuthenticationOptions>()?
            .map(|o| o.user_options)
            .unwrap_or_default();
        Ok(Self::new(token_provider, user_options)
            .with_claims_extenders(services.get_all::<SharedClaimsExtender>()?)
            .with_post_processors(services.get_all::<SharedPostProcessor>()?)
            .with_post_processors(
                services
                    .get_all::<ApplicationUserHook>()?
                    .into_iter()
                    .map(ApplicationUserHook::into_processor),
            ))
    }

    pub fn user_options(&self) -> &RemoteAuthenticationUserOptions {
        &self.user_options
    }

    /// Build the principal for `account`. `None` yields an anonymous principal.
    pub async fn create_user(&self, account: Option<&RemoteUserAccount>) -> ClaimsPrincipal {
        let Some(account) = account else {
            debug!("No remote account, using anonymous principal");
            return ClaimsPrincipal::anonymous();
        };

        let mut identity = self.build_identity(account);
        self.map_identity(&mut identity).await;

        for extender in &self.claims_extenders {
            if let Err(e) = extender.extend_claims(&mut identity).await {
                warn!(extender = extender.name(), error = %e, "Claims extender failed");
            }
        }

        let principal = ClaimsPrincipal::new(identity);
        for processor in &self.post_processors {
            if let Err(e) = processor.process(&principal).await {
                warn!(processor = processor.name(), error = %e, "Authentication post-processor failed");
            }
        }
        principal
    }

    /// Enrich `identity` from the access token, logging any failure.
    pub async fn map_identity(&self, identity: &mut ClaimsIdentity) {
        match self.try_map_identity(identity).await {
            Ok(added) => debug!(roles_added = added, "Identity enriched from access token"),
            Err(e) => error!(error = %e, "Failed to enrich identity from access token"),
        }
    }

    /// Enrich `identity` from the access token.
    ///
    /// On error the identity is left unchanged. Returns the number of role
    /// claims added.
    pub async fn try_map_identity(&self, identity: &mut ClaimsIdentity) -> Result<usize, EnrichmentError> {
        let token = self.token_provider.request_access_token().await?;
        let token = JsonWebToken::parse(&token.value)?;
        enrich_identity(identity, &token)
    }

    fn build_identity(&self, account: &RemoteUserAccount) -> ClaimsIdentity {
        ClaimsIdentity::new(self.user_options.authentication_type.as_str())
            .with_claim_types(
                self.user_options.name_claim.as_str(),
                self.user_options.role_claim.as_str(),
            )
            .with_claims(claims_from_json(account.claims()))
    }
}
