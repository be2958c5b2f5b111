/// Errors raised while reading tokens and claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    /// The token does not have the `header.payload.signature` shape, or a
    /// segment is not valid base64url.
    MalformedToken(String),

    /// The JWT header could not be decoded.
    InvalidHeader(String),

    /// The payload is not a JSON object.
    InvalidPayload(String),
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityError::MalformedToken(msg) => write!(f, "Malformed token: {msg}"),
            SecurityError::InvalidHeader(msg) => write!(f, "Invalid token header: {msg}"),
            SecurityError::InvalidPayload(msg) => write!(f, "Invalid token payload: {msg}"),
        }
    }
}

impl std::error::Error for SecurityError {}
