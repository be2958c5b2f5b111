use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use nimbus_oidc::{
    AuthenticationPostProcessor, ClaimsExtender, EnrichmentError, HookError,
    OidcClaimsPrincipalFactory, RemoteAuthenticationUserOptions, RemoteUserAccount,
    SharedClaimsExtender, SharedPostProcessor,
};
use nimbus_security::{
    AccessTokenError, Claim, ClaimsIdentity, ClaimsPrincipal, SharedAccessTokenProvider,
    StaticAccessTokenProvider,
};
use serde_json::json;

fn unsigned_token(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2ln")
}

fn account(value: serde_json::Value) -> RemoteUserAccount {
    serde_json::from_value(value).unwrap()
}

fn factory_with(provider: StaticAccessTokenProvider) -> OidcClaimsPrincipalFactory {
    OidcClaimsPrincipalFactory::new(
        SharedAccessTokenProvider::new(provider),
        RemoteAuthenticationUserOptions::default(),
    )
}

fn role_values(principal: &ClaimsPrincipal) -> Vec<String> {
    principal.identity().roles().map(str::to_string).collect()
}

struct TagExtender(&'static str);

impl ClaimsExtender for TagExtender {
    async fn extend_claims(&self, identity: &mut ClaimsIdentity) -> Result<(), HookError> {
        identity.add_claim(Claim::new("tag", self.0));
        Ok(())
    }
}

struct FailingExtender;

impl ClaimsExtender for FailingExtender {
    async fn extend_claims(&self, _identity: &mut ClaimsIdentity) -> Result<(), HookError> {
        Err(HookError::new("extender failed"))
    }
}

#[derive(Clone, Default)]
struct RecordingProcessor {
    seen: Arc<Mutex<Vec<Vec<String>>>>,
}

impl AuthenticationPostProcessor for RecordingProcessor {
    async fn process(&self, principal: &ClaimsPrincipal) -> Result<(), HookError> {
        let tags = principal
            .identity()
            .find_all("tag")
            .map(|c| c.value.clone())
            .collect();
        self.seen.lock().unwrap().push(tags);
        Err(HookError::new("recorded"))
    }
}

#[tokio::test]
async fn no_account_yields_anonymous_principal() {
    let factory = factory_with(StaticAccessTokenProvider::token("unused"));

    let principal = factory.create_user(None).await;

    assert!(!principal.is_authenticated());
    assert!(principal.identity().claims().is_empty());
}

#[tokio::test]
async fn account_claims_are_enriched_from_access_token() {
    let token = unsigned_token(json!({
        "iss": "https://idp.example",
        "roles": ["app:admin", "app:user"]
    }));
    let factory = factory_with(StaticAccessTokenProvider::token(token));
    let account = account(json!({
        "sub": "u1",
        "name": "Ada",
        "roles": "app:user"
    }));

    let principal = factory.create_user(Some(&account)).await;

    assert!(principal.is_authenticated());
    assert_eq!(principal.identity().authentication_type(), Some("oidc"));
    assert_eq!(principal.identity().name(), Some("Ada"));
    assert_eq!(
        principal.find_first("iss").map(|c| c.value.as_str()),
        Some("https://idp.example")
    );
    assert_eq!(role_values(&principal), ["app:user", "app:admin"]);
}

#[tokio::test]
async fn unavailable_token_leaves_claims_unchanged() {
    let factory = factory_with(StaticAccessTokenProvider::unavailable());
    let account = account(json!({ "sub": "u1", "roles": ["reader"] }));

    let principal = factory.create_user(Some(&account)).await;

    assert!(principal.is_authenticated());
    assert!(principal.find_first("iss").is_none());
    assert_eq!(role_values(&principal), ["reader"]);
}

#[tokio::test]
async fn try_map_identity_reports_each_failure() {
    let mut identity = ClaimsIdentity::new("oidc");

    let err = factory_with(StaticAccessTokenProvider::failing(AccessTokenError::Provider(
        "offline".into(),
    )))
    .try_map_identity(&mut identity)
    .await
    .unwrap_err();
    assert!(matches!(err, EnrichmentError::TokenUnavailable(_)));

    let err = factory_with(StaticAccessTokenProvider::token("not-a-jwt"))
        .try_map_identity(&mut identity)
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichmentError::InvalidToken(_)));

    let err = factory_with(StaticAccessTokenProvider::token(unsigned_token(json!({ "sub": "u1" }))))
        .try_map_identity(&mut identity)
        .await
        .unwrap_err();
    assert_eq!(err, EnrichmentError::MissingIssuer);

    assert!(identity.claims().is_empty());
}

#[tokio::test]
async fn hooks_run_in_order_and_errors_do_not_stop_the_pipeline() {
    let token = unsigned_token(json!({ "iss": "https://idp.example" }));
    let recorder = RecordingProcessor::default();
    let factory = factory_with(StaticAccessTokenProvider::token(token))
        .with_claims_extenders([
            SharedClaimsExtender::new(TagExtender("first")),
            SharedClaimsExtender::new(FailingExtender),
            SharedClaimsExtender::new(TagExtender("second")),
        ])
        .with_post_processors([
            SharedPostProcessor::new(recorder.clone()),
            SharedPostProcessor::new(recorder.clone()),
        ]);

    let principal = factory
        .create_user(Some(&account(json!({ "sub": "u1" }))))
        .await;

    let tags: Vec<&str> = principal
        .identity()
        .find_all("tag")
        .map(|c| c.value.as_str())
        .collect();
    assert_eq!(tags, ["first", "second"]);

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], ["first", "second"]);
}

#[tokio::test]
async fn custom_claim_types_shape_the_identity() {
    let token = unsigned_token(json!({
        "iss": "https://idp.example",
        "groups": ["ops"]
    }));
    let factory = OidcClaimsPrincipalFactory::new(
        SharedAccessTokenProvider::new(StaticAccessTokenProvider::token(token)),
        RemoteAuthenticationUserOptions {
            name_claim: "preferred_username".into(),
            role_claim: "groups".into(),
            ..Default::default()
        },
    );

    let principal = factory
        .create_user(Some(&account(json!({ "preferred_username": "ada", "name": "Ada L." }))))
        .await;

    assert_eq!(principal.identity().name(), Some("ada"));
    assert!(principal.is_in_role("ops"));
}

#[tokio::test]
async fn tokens_signed_with_any_algorithm_are_enriched() {
    for alg in ["ES512", "none"] {
        let header = URL_SAFE_NO_PAD.encode(json!({ "alg": alg, "typ": "JWT" }).to_string());
        let body = URL_SAFE_NO_PAD.encode(
            json!({ "iss": "https://idp.example", "roles": ["admin"] }).to_string(),
        );
        let factory = factory_with(StaticAccessTokenProvider::token(format!("{header}.{body}.c2ln")));

        let principal = factory
            .create_user(Some(&account(json!({ "sub": "u1" }))))
            .await;

        assert_eq!(
            principal.find_first("iss").map(|c| c.value.as_str()),
            Some("https://idp.example")
        );
        assert_eq!(role_values(&principal), ["admin"]);
    }
}
