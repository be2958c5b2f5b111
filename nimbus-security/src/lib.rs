pub mod authorization;
pub mod claims;
pub mod error;
pub mod jwt;
pub mod token;

// Re-export primary public types for convenience.
pub use authorization::{
    ApplicationRoles, AuthorizationOptions, AuthorizationPolicies, AuthorizationPolicy,
};
pub use claims::{Claim, ClaimTypes, ClaimsIdentity, ClaimsPrincipal};
pub use error::SecurityError;
pub use jwt::JsonWebToken;
pub use token::{
    AccessToken, AccessTokenError, AccessTokenProvider, SharedAccessTokenProvider,
    StaticAccessTokenProvider,
};

pub mod prelude {
    //! Re-exports of the most commonly used security types.
    pub use crate::{
        AccessToken, AccessTokenProvider, AuthorizationOptions, Claim, ClaimsIdentity,
        ClaimsPrincipal, JsonWebToken,
    };
}
