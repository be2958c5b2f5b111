//! Named authorization policies.
//!
//! Policies here are data: a name, whether an authenticated user is required,
//! and the roles that satisfy it. Evaluating them against a request is left
//! to the host.

/// Application role names, lowest to highest privilege.
pub struct ApplicationRoles;

impl ApplicationRoles {
    pub const USER: &'static str = "app:user";
    pub const INTERNAL: &'static str = "app:internal";
    pub const AGENT: &'static str = "app:agent";
    pub const MANAGER: &'static str = "app:manager";
    pub const ADMIN: &'static str = "app:admin";

    /// All roles, lowest privilege first.
    pub const ALL: [&'static str; 5] = [
        Self::USER,
        Self::INTERNAL,
        Self::AGENT,
        Self::MANAGER,
        Self::ADMIN,
    ];
}

/// Names of the policies installed by [`AuthorizationOptions::with_default_policies`].
pub struct AuthorizationPolicies;

impl AuthorizationPolicies {
    pub const STANDARD: &'static str = "Standard";
    pub const STANDARD_INTERNAL: &'static str = "StandardInternal";
    pub const STANDARD_AGENT: &'static str = "StandardAgent";
    pub const STANDARD_MANAGER: &'static str = "StandardManager";
    pub const STANDARD_ADMIN: &'static str = "StandardAdmin";
}

/// A single authorization policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    require_authenticated_user: bool,
    required_roles: Vec<String>,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationPolicy {
    /// A policy that only requires an authenticated user.
    pub fn new() -> Self {
        Self {
            require_authenticated_user: true,
            required_roles: Vec::new(),
        }
    }

    /// A policy satisfied by any of `roles`.
    pub fn with_any_role(roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new().require_roles(roles)
    }

    /// Add roles; the policy is satisfied by any one of them.
    pub fn require_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required_roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Allow anonymous users (only meaningful without required roles).
    pub fn allow_anonymous(mut self) -> Self {
        self.require_authenticated_user = false;
        self
    }

    pub fn requires_authenticated_user(&self) -> bool {
        self.require_authenticated_user
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }
}

/// Ordered registry of named policies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationOptions {
    policies: Vec<(String, AuthorizationPolicy)>,
    default_policy: Option<String>,
}

impl AuthorizationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options holding the five standard policies, with `Standard` as default.
    ///
    /// Each standard policy admits its own role and every role above it.
    pub fn with_default_policies() -> Self {
        let mut options = Self::new();
        let names = [
            AuthorizationPolicies::STANDARD,
            AuthorizationPolicies::STANDARD_INTERNAL,
            AuthorizationPolicies::STANDARD_AGENT,
            AuthorizationPolicies::STANDARD_MANAGER,
            AuthorizationPolicies::STANDARD_ADMIN,
        ];
        for (level, name) in names.into_iter().enumerate() {
            options.add_policy(
                name,
                AuthorizationPolicy::with_any_role(ApplicationRoles::ALL[level..].iter().copied()),
            );
        }
        options.set_default_policy(AuthorizationPolicies::STANDARD);
        options
    }

    /// Add a policy. A policy with the same name is replaced in place.
    pub fn add_policy(&mut self, name: impl Into<String>, policy: AuthorizationPolicy) -> &mut Self {
        let name = name.into();
        match self.policies.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = policy,
            None => self.policies.push((name, policy)),
        }
        self
    }

    /// Remove a policy by name, returning it.
    pub fn remove_policy(&mut self, name: &str) -> Option<AuthorizationPolicy> {
        let index = self.policies.iter().position(|(n, _)| n == name)?;
        if self.default_policy.as_deref() == Some(name) {
            self.default_policy = None;
        }
        Some(self.policies.remove(index).1)
    }

    pub fn get_policy(&self, name: &str) -> Option<&AuthorizationPolicy> {
        self.policies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    /// Policy names in registration order.
    pub fn policy_names(&self) -> impl Iterator<Item = &str> {
        self.policies.iter().map(|(n, _)| n.as_str())
    }

    pub fn set_default_policy(&mut self, name: impl Into<String>) -> &mut Self {
        self.default_policy = Some(name.into());
        self
    }

    pub fn default_policy_name(&self) -> Option<&str> {
        self.default_policy.as_deref()
    }

    /// The default policy, if one is set and registered.
    pub fn default_policy(&self) -> Option<&AuthorizationPolicy> {
        self.default_policy
            .as_deref()
            .and_then(|name| self.get_policy(name))
    }
}
