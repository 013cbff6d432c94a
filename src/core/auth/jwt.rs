//! JWT payload decoding for expiration checks
//!
//! Tokens are decoded but never verified: the signature segment is ignored.
//! A tampered but well-formed token passes these checks; the backend is
//! responsible for rejecting it on every protected request.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::Utc;
use serde_json::{Map, Value};

/// base64url, padded or not
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// JWT errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),
}

/// Decoded JWT payload
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    payload: Map<String, Value>,
}

impl Claims {
    /// Expiration (seconds since epoch). Numeric strings are accepted; any
    /// other non-numeric value counts as absent.
    pub fn exp(&self) -> Option<f64> {
        match self.payload.get("exp")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|exp| exp.is_finite()),
            _ => None,
        }
    }

    /// Subject claim
    pub fn subject(&self) -> Option<&str> {
        self.payload.get("sub").and_then(Value::as_str)
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.payload.get(claim)
    }

    /// Expired when `exp` is present and strictly before `now_secs`
    pub fn is_expired_at(&self, now_secs: f64) -> bool {
        self.exp().is_some_and(|exp| exp < now_secs)
    }

    pub fn into_payload(self) -> Map<String, Value> {
        self.payload
    }
}

/// Decode the payload (middle) segment of a token without verifying it
pub fn decode_payload(token: &str) -> Result<Claims, JwtError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_), Some(payload)) if !payload.is_empty() => payload,
        _ => {
            return Err(JwtError::MalformedToken(
                "missing payload segment".to_string(),
            ));
        }
    };

    let bytes = PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|e| JwtError::MalformedToken(format!("payload is not base64url: {e}")))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(payload)) => Ok(Claims { payload }),
        Ok(_) => Err(JwtError::MalformedToken(
            "payload is not a JSON object".to_string(),
        )),
        Err(e) => Err(JwtError::MalformedToken(format!(
            "payload is not valid JSON: {e}"
        ))),
    }
}

/// Current time in (fractional) seconds since epoch
pub fn now_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Whether a token is present, decodable and not expired.
///
/// Tokens without an `exp` claim never expire.
pub fn is_valid(token: Option<&str>) -> bool {
    is_valid_at(token, now_secs())
}

/// `is_valid` against an explicit clock
pub fn is_valid_at(token: Option<&str>, now_secs: f64) -> bool {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return false;
    };

    match decode_payload(token) {
        Ok(claims) if claims.is_expired_at(now_secs) => {
            tracing::debug!("Token is expired");
            false
        }
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Error validating token: {}", e);
            false
        }
    }
}
