//! Reconcile an identity's issuer and role claims with its access token.

use std::collections::HashSet;

use nimbus_security::claims::eq_ignore_case;
use nimbus_security::{Claim, ClaimTypes, ClaimsIdentity, JsonWebToken};
use tracing::debug;

use crate::error::EnrichmentError;

/// Map issuer, then roles. A missing issuer aborts before roles are touched.
///
/// Returns the number of role claims added.
pub fn enrich_identity(
    identity: &mut ClaimsIdentity,
    token: &JsonWebToken,
) -> Result<usize, EnrichmentError> {
    map_issuer(identity, token)?;
    Ok(map_roles(identity, token))
}

/// Reconcile the `iss` claim.
///
/// - identity has an issuer, token has a different one (case-insensitive):
///   the token's issuer replaces every issuer claim on the identity
/// - identity has an issuer, token has none or the same one: unchanged
/// - identity has no issuer: the token's issuer is adopted, or
///   [`EnrichmentError::MissingIssuer`] if the token has none
pub fn map_issuer(identity: &mut ClaimsIdentity, token: &JsonWebToken) -> Result<(), EnrichmentError> {
    let token_issuer = token.issuer();
    let existing = identity
        .find_first(ClaimTypes::ISSUER)
        .map(|c| c.value.clone());

    let Some(existing) = existing else {
        let issuer = token_issuer.ok_or(EnrichmentError::MissingIssuer)?;
        identity.add_claim(issuer.clone());
        return Ok(());
    };

    if let Some(issuer) = token_issuer {
        if !eq_ignore_case(&existing, &issuer.value) {
            debug!(old = %existing, new = %issuer.value, "Replacing issuer claim from access token");
            identity.remove_all(ClaimTypes::ISSUER);
            identity.add_claim(issuer.clone());
        }
    }
    Ok(())
}

/// Append token role claims the identity does not already carry.
///
/// Token claims whose type matches the identity's role-claim type are added
/// under that type, in token order, unless their value is already present
/// (case-insensitive). Returns the number of claims added.
pub fn map_roles(identity: &mut ClaimsIdentity, token: &JsonWebToken) -> usize {
    let role_claim_type = identity.role_claim_type().to_string();
    let mut seen: HashSet<String> = identity.roles().map(str::to_lowercase).collect();

    let mut added = 0;
    for claim in token.claims() {
        if claim.is_type(&role_claim_type) && seen.insert(claim.value.to_lowercase()) {
            identity.add_claim(Claim::new(role_claim_type.as_str(), claim.value.as_str()));
            added += 1;
        }
    }
    added
}
