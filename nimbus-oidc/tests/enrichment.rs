use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use nimbus_oidc::{enrich_identity, map_issuer, map_roles, EnrichmentError};
use nimbus_security::{Claim, ClaimsIdentity, JsonWebToken};
use serde_json::json;

fn token(payload: serde_json::Value) -> JsonWebToken {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    JsonWebToken::parse(&format!("{header}.{body}.c2ln")).unwrap()
}

fn identity(claims: &[(&str, &str)]) -> ClaimsIdentity {
    ClaimsIdentity::new("oidc").with_claims(claims.iter().map(|(t, v)| Claim::new(*t, *v)))
}

fn values<'a>(identity: &'a ClaimsIdentity, claim_type: &'a str) -> Vec<&'a str> {
    identity
        .find_all(claim_type)
        .map(|c| c.value.as_str())
        .collect()
}

// ── Issuer ──────────────────────────────────────────────────────────────────

#[test]
fn issuer_is_replaced_when_token_differs() {
    let mut id = identity(&[("iss", "https://old.example"), ("sub", "u1")]);
    let jwt = token(json!({ "iss": "https://new.example" }));

    map_issuer(&mut id, &jwt).unwrap();

    assert_eq!(values(&id, "iss"), ["https://new.example"]);
    assert_eq!(values(&id, "sub"), ["u1"]);
}

#[test]
fn issuer_comparison_ignores_case() {
    let mut id = identity(&[("iss", "https://IDP.example")]);
    let jwt = token(json!({ "iss": "https://idp.example" }));

    map_issuer(&mut id, &jwt).unwrap();

    assert_eq!(values(&id, "iss"), ["https://IDP.example"]);
}

#[test]
fn issuer_kept_when_token_has_none() {
    let mut id = identity(&[("iss", "https://idp.example")]);
    let jwt = token(json!({ "sub": "u1" }));

    map_issuer(&mut id, &jwt).unwrap();

    assert_eq!(values(&id, "iss"), ["https://idp.example"]);
}

#[test]
fn issuer_adopted_from_token_when_identity_has_none() {
    let mut id = identity(&[("sub", "u1")]);
    let jwt = token(json!({ "iss": "https://idp.example" }));

    map_issuer(&mut id, &jwt).unwrap();

    assert_eq!(values(&id, "iss"), ["https://idp.example"]);
}

#[test]
fn missing_issuer_everywhere_is_an_error() {
    let mut id = identity(&[("sub", "u1")]);
    let jwt = token(json!({ "sub": "u1" }));

    let err = map_issuer(&mut id, &jwt).unwrap_err();

    assert_eq!(err, EnrichmentError::MissingIssuer);
    assert_eq!(err.to_string(), "Issuer claim is missing or invalid.");
    assert!(id.find_first("iss").is_none());
}

#[test]
fn replacing_issuer_removes_every_previous_issuer() {
    let mut id = identity(&[("iss", "https://a.example"), ("iss", "https://b.example")]);
    let jwt = token(json!({ "iss": "https://c.example" }));

    map_issuer(&mut id, &jwt).unwrap();

    assert_eq!(values(&id, "iss"), ["https://c.example"]);
}

// ── Roles ───────────────────────────────────────────────────────────────────

#[test]
fn roles_are_merged_without_duplicates() {
    let mut id = identity(&[("roles", "admin")]);
    let jwt = token(json!({ "roles": ["Admin", "reader", "writer"] }));

    let added = map_roles(&mut id, &jwt);

    assert_eq!(added, 2);
    assert_eq!(values(&id, "roles"), ["admin", "reader", "writer"]);
}

#[test]
fn roles_duplicated_inside_token_are_added_once() {
    let mut id = identity(&[]);
    let jwt = token(json!({ "roles": ["reader", "READER", "reader"] }));

    assert_eq!(map_roles(&mut id, &jwt), 1);
    assert_eq!(values(&id, "roles"), ["reader"]);
}

#[test]
fn issuer_and_roles_fold_non_ascii_case_alike() {
    let mut id = identity(&[("iss", "https://ÉQUIPE.example"), ("roles", "Équipe")]);
    let jwt = token(json!({ "iss": "https://équipe.example", "roles": ["ÉQUIPE", "Straße"] }));

    enrich_identity(&mut id, &jwt).unwrap();

    assert_eq!(values(&id, "iss"), ["https://ÉQUIPE.example"]);
    assert_eq!(values(&id, "roles"), ["Équipe", "Straße"]);
}

#[test]
fn roles_use_the_identity_role_claim_type() {
    let mut id = ClaimsIdentity::new("oidc").with_claim_types("name", "groups");
    let jwt = token(json!({ "Groups": ["ops"], "roles": ["ignored"] }));

    map_roles(&mut id, &jwt);

    assert_eq!(values(&id, "groups"), ["ops"]);
    assert_eq!(id.claims()[0].claim_type, "groups");
    assert!(id.find_first("roles").is_none());
    assert!(id.is_in_role("ops"));
}

#[test]
fn role_mapping_never_removes_claims() {
    let mut id = identity(&[("roles", "legacy"), ("email", "a@example.com")]);
    let jwt = token(json!({ "roles": ["reader"] }));

    map_roles(&mut id, &jwt);

    assert_eq!(values(&id, "roles"), ["legacy", "reader"]);
    assert_eq!(values(&id, "email"), ["a@example.com"]);
}

#[test]
fn enrichment_is_idempotent() {
    let mut id = identity(&[("iss", "https://old.example"), ("roles", "admin")]);
    let jwt = token(json!({ "iss": "https://new.example", "roles": ["admin", "reader"] }));

    enrich_identity(&mut id, &jwt).unwrap();
    let once = id.clone();
    assert_eq!(enrich_identity(&mut id, &jwt).unwrap(), 0);

    assert_eq!(id, once);
}

#[test]
fn failing_issuer_leaves_roles_untouched() {
    let mut id = identity(&[("roles", "admin")]);
    let jwt = token(json!({ "roles": ["reader"] }));

    assert!(enrich_identity(&mut id, &jwt).is_err());

    assert_eq!(values(&id, "roles"), ["admin"]);
}
