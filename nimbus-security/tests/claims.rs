use nimbus_security::claims::{claims_from_json, eq_ignore_case, Claim, ClaimTypes, ClaimsIdentity, ClaimsPrincipal};
use serde_json::json;

fn identity_with(claims: &[(&str, &str)]) -> ClaimsIdentity {
    ClaimsIdentity::new("oidc").with_claims(claims.iter().map(|(t, v)| Claim::new(*t, *v)))
}

// ── Identity basics ──

#[test]
fn new_identity_is_authenticated_with_default_claim_types() {
    let identity = ClaimsIdentity::new("oidc");
    assert!(identity.is_authenticated());
    assert_eq!(identity.authentication_type(), Some("oidc"));
    assert_eq!(identity.name_claim_type(), "name");
    assert_eq!(identity.role_claim_type(), "roles");
    assert!(identity.claims().is_empty());
}

#[test]
fn anonymous_identity_is_not_authenticated() {
    assert!(!ClaimsIdentity::anonymous().is_authenticated());
    assert!(!ClaimsIdentity::new("").is_authenticated());
    assert!(!ClaimsPrincipal::anonymous().is_authenticated());
}

#[test]
fn find_first_matches_type_case_insensitively() {
    let identity = identity_with(&[("ISS", "https://a"), ("iss", "https://b")]);
    assert_eq!(identity.find_first("iss").unwrap().value, "https://a");
    assert!(identity.find_first("sub").is_none());
}

#[test]
fn find_all_keeps_order() {
    let identity = identity_with(&[("roles", "a"), ("name", "n"), ("Roles", "b")]);
    let values: Vec<&str> = identity.find_all("roles").map(|c| c.value.as_str()).collect();
    assert_eq!(values, vec!["a", "b"]);
}

#[test]
fn has_claim_compares_value_exactly() {
    let identity = identity_with(&[("roles", "Admin")]);
    assert!(identity.has_claim("ROLES", "Admin"));
    assert!(!identity.has_claim("roles", "admin"));
}

#[test]
fn remove_claim_removes_first_match_only() {
    let mut identity = identity_with(&[("roles", "a"), ("roles", "a"), ("roles", "b")]);
    assert!(identity.remove_claim(&Claim::new("roles", "a")));
    let values: Vec<&str> = identity.roles().collect();
    assert_eq!(values, vec!["a", "b"]);
}

#[test]
fn remove_missing_claim_returns_false() {
    let mut identity = identity_with(&[("roles", "a")]);
    assert!(!identity.remove_claim(&Claim::new("roles", "z")));
    assert_eq!(identity.claims().len(), 1);
}

#[test]
fn name_and_roles_follow_configured_claim_types() {
    let identity = ClaimsIdentity::new("oidc")
        .with_claim_types("preferred_username", "groups")
        .with_claims([
            Claim::new("name", "ignored"),
            Claim::new("preferred_username", "alice"),
            Claim::new("roles", "ignored-role"),
            Claim::new("groups", "admins"),
        ]);
    assert_eq!(identity.name(), Some("alice"));
    assert_eq!(identity.roles().collect::<Vec<_>>(), vec!["admins"]);
    assert!(identity.is_in_role("admins"));
    assert!(!identity.is_in_role("ignored-role"));
}

#[test]
fn principal_delegates_to_identity() {
    let principal: ClaimsPrincipal = identity_with(&[(ClaimTypes::SUBJECT, "user-1"), ("roles", "x")]).into();
    assert!(principal.is_authenticated());
    assert_eq!(principal.find_first("sub").unwrap().value, "user-1");
    assert!(principal.is_in_role("x"));
    assert_eq!(principal.into_identity().claims().len(), 2);
}

// ── JSON flattening ──

#[test]
fn claims_from_json_flattens_values() {
    let payload = json!({
        "sub": "user-1",
        "roles": ["admin", "user"],
        "exp": 1700000000,
        "email_verified": true,
        "nothing": null,
        "address": { "country": "FR" }
    });
    let claims = claims_from_json(payload.as_object().unwrap());

    assert_eq!(
        claims,
        vec![
            Claim::new("sub", "user-1"),
            Claim::new("roles", "admin"),
            Claim::new("roles", "user"),
            Claim::new("exp", "1700000000"),
            Claim::new("email_verified", "true"),
            Claim::new("address", r#"{"country":"FR"}"#),
        ]
    );
}

#[test]
fn eq_ignore_case_handles_non_ascii() {
    assert!(eq_ignore_case("ADMIN", "admin"));
    assert!(eq_ignore_case("ÉQUIPE", "équipe"));
    assert!(!eq_ignore_case("admin", "admins"));
    assert!(!eq_ignore_case("Straße", "STRASSE"));
    for (a, b) in [("Équipe", "ÉQUIPE"), ("Ωmega", "ωMEGA"), ("Admin", "admin")] {
        assert_eq!(eq_ignore_case(a, b), a.to_lowercase() == b.to_lowercase());
    }
}

#[test]
fn claims_from_json_flattens_arrays_one_level() {
    let payload = json!({
        "roles": [["a", "b"], "c", null, { "scope": "x" }, 7]
    });
    let claims = claims_from_json(payload.as_object().unwrap());

    assert_eq!(
        claims,
        vec![
            Claim::new("roles", r#"["a","b"]"#),
            Claim::new("roles", "c"),
            Claim::new("roles", r#"{"scope":"x"}"#),
            Claim::new("roles", "7"),
        ]
    );
}
