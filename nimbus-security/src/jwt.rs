use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

use crate::claims::{Claim, ClaimTypes};
use crate::error::SecurityError;

/// A JWT read for its claims only.
///
/// Parsing checks the token shape and decodes header and payload. It does
/// **not** verify the signature, expiry or audience: the token has already
/// been accepted by the host token provider and is only inspected here. Any
/// `alg` value is accepted, including ones unknown to this crate and `none`.
#[derive(Debug, Clone)]
pub struct JsonWebToken {
    header: Map<String, Value>,
    payload: Map<String, Value>,
    claims: Vec<Claim>,
}

impl JsonWebToken {
    /// Decode `token` without validating it.
    pub fn parse(token: &str) -> Result<Self, SecurityError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(SecurityError::MalformedToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        let header = base64url(segments[0])
            .map_err(|e| SecurityError::InvalidHeader(format!("not base64url: {e}")))
            .and_then(|bytes| json_object(&bytes).map_err(SecurityError::InvalidHeader))?;
        let payload = base64url(segments[1])
            .map_err(|e| SecurityError::MalformedToken(format!("payload is not base64url: {e}")))
            .and_then(|bytes| json_object(&bytes).map_err(SecurityError::InvalidPayload))?;

        let claims = crate::claims::claims_from_json(&payload);
        debug!(
            alg = header.get("alg").and_then(serde_json::Value::as_str).unwrap_or("<none>"),
            claim_count = claims.len(),
            "Decoded access token"
        );

        Ok(Self {
            header,
            payload,
            claims,
        })
    }

    /// Raw header object.
    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// The `alg` header, as written in the token.
    pub fn algorithm(&self) -> Option<&str> {
        self.header_str("alg")
    }

    /// The `typ` header.
    pub fn token_type(&self) -> Option<&str> {
        self.header_str("typ")
    }

    /// The `kid` header.
    pub fn key_id(&self) -> Option<&str> {
        self.header_str("kid")
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.header.get(name).and_then(Value::as_str)
    }

    /// Raw payload object.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Flattened payload claims, in payload order.
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// First claim of the given type (case-insensitive).
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.is_type(claim_type))
    }

    /// The `iss` claim, if present.
    pub fn issuer(&self) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_type == ClaimTypes::ISSUER)
    }
}

fn base64url(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))
}

fn json_object(bytes: &[u8]) -> Result<Map<String, Value>, String> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
