//! Claims model: typed `(type, value)` pairs grouped into an identity.
//!
//! Claim *types* are matched case-insensitively everywhere in this module.
//! Claim *values* are compared exactly unless a method says otherwise.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known claim types.
pub struct ClaimTypes;

impl ClaimTypes {
    pub const ISSUER: &'static str = "iss";
    pub const SUBJECT: &'static str = "sub";
    pub const NAME: &'static str = "name";
    pub const ROLES: &'static str = "roles";
    pub const EMAIL: &'static str = "email";
}

/// Case-insensitive string equality: both sides compared after Unicode
/// [`str::to_lowercase`]. Role de-duplication folds values the same way.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// A single claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }

    /// Whether this claim has the given type (case-insensitive).
    pub fn is_type(&self, claim_type: &str) -> bool {
        eq_ignore_case(&self.claim_type, claim_type)
    }
}

/// Flatten a JSON object into claims, keeping key order.
///
/// - strings are taken as-is
/// - numbers and booleans use their string form
/// - arrays produce one claim per element, flattened one level only: an
///   element that is itself an array or object becomes one claim holding its
///   JSON text (`[["a","b"]]` gives the single value `["a","b"]`)
/// - nested objects are kept as JSON text
/// - `null` produces no claim, inside an array too
pub fn claims_from_json(object: &Map<String, Value>) -> Vec<Claim> {
    let mut claims = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            Value::Array(items) => {
                claims.extend(
                    items
                        .iter()
                        .filter_map(json_claim_value)
                        .map(|v| Claim::new(key.as_str(), v)),
                );
            }
            other => {
                if let Some(v) = json_claim_value(other) {
                    claims.push(Claim::new(key.as_str(), v));
                }
            }
        }
    }
    claims
}

fn json_claim_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// An ordered set of claims describing one authenticated (or anonymous) subject.
///
/// The name- and role-claim types say which claim types [`name`](Self::name)
/// and [`roles`](Self::roles) read. They default to `name` and `roles`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsIdentity {
    authentication_type: Option<String>,
    name_claim_type: String,
    role_claim_type: String,
    claims: Vec<Claim>,
}

impl Default for ClaimsIdentity {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl ClaimsIdentity {
    /// Create an empty authenticated identity.
    pub fn new(authentication_type: impl Into<String>) -> Self {
        Self {
            authentication_type: Some(authentication_type.into()),
            ..Self::anonymous()
        }
    }

    /// Create an empty, unauthenticated identity.
    pub fn anonymous() -> Self {
        Self {
            authentication_type: None,
            name_claim_type: ClaimTypes::NAME.to_string(),
            role_claim_type: ClaimTypes::ROLES.to_string(),
            claims: Vec::new(),
        }
    }

    /// Set the claim types used for the display name and for roles.
    pub fn with_claim_types(
        mut self,
        name_claim_type: impl Into<String>,
        role_claim_type: impl Into<String>,
    ) -> Self {
        self.name_claim_type = name_claim_type.into();
        self.role_claim_type = role_claim_type.into();
        self
    }

    pub fn with_claims(mut self, claims: impl IntoIterator<Item = Claim>) -> Self {
        self.claims.extend(claims);
        self
    }

    pub fn authentication_type(&self) -> Option<&str> {
        self.authentication_type.as_deref()
    }

    /// An identity is authenticated when it carries a non-empty authentication type.
    pub fn is_authenticated(&self) -> bool {
        self.authentication_type
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    pub fn name_claim_type(&self) -> &str {
        &self.name_claim_type
    }

    pub fn role_claim_type(&self) -> &str {
        &self.role_claim_type
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// First claim of the given type.
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.is_type(claim_type))
    }

    /// All claims of the given type, in order.
    pub fn find_all<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a Claim> + 'a {
        self.claims.iter().filter(move |c| c.is_type(claim_type))
    }

    /// Whether a claim with this type and exact value exists.
    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.find_all(claim_type).any(|c| c.value == value)
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    pub fn add_claims(&mut self, claims: impl IntoIterator<Item = Claim>) {
        self.claims.extend(claims);
    }

    /// Remove the first claim matching `claim` (type case-insensitive, value exact).
    ///
    /// Returns `false` if no such claim exists.
    pub fn remove_claim(&mut self, claim: &Claim) -> bool {
        let position = self
            .claims
            .iter()
            .position(|c| c.is_type(&claim.claim_type) && c.value == claim.value);
        match position {
            Some(index) => {
                self.claims.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every claim of the given type, returning how many were removed.
    pub fn remove_all(&mut self, claim_type: &str) -> usize {
        let before = self.claims.len();
        self.claims.retain(|c| !c.is_type(claim_type));
        before - self.claims.len()
    }

    /// Value of the first name claim.
    pub fn name(&self) -> Option<&str> {
        self.find_first(&self.name_claim_type).map(|c| c.value.as_str())
    }

    /// Values of all role claims, in order.
    pub fn roles(&self) -> impl Iterator<Item = &str> + '_ {
        let role_type = self.role_claim_type.as_str();
        self.claims
            .iter()
            .filter(move |c| c.is_type(role_type))
            .map(|c| c.value.as_str())
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles().any(|r| r == role)
    }
}

/// The signed-in user as seen by the application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsPrincipal {
    identity: ClaimsIdentity,
}

impl ClaimsPrincipal {
    pub fn new(identity: ClaimsIdentity) -> Self {
        Self { identity }
    }

    /// A principal with an unauthenticated, claim-less identity.
    pub fn anonymous() -> Self {
        Self::new(ClaimsIdentity::anonymous())
    }

    pub fn identity(&self) -> &ClaimsIdentity {
        &self.identity
    }

    pub fn identity_mut(&mut self) -> &mut ClaimsIdentity {
        &mut self.identity
    }

    pub fn into_identity(self) -> ClaimsIdentity {
        self.identity
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_authenticated()
    }

    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.identity.find_first(claim_type)
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        self.identity.is_in_role(role)
    }
}

impl From<ClaimsIdentity> for ClaimsPrincipal {
    fn from(identity: ClaimsIdentity) -> Self {
        Self::new(identity)
    }
}
