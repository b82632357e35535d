use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Token claims: whatever identity object the caller posted, plus timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(mut payload: Map<String, Value>, expiry: Duration) -> Self {
        payload.remove("exp");
        payload.remove("iat");
        let now = Utc::now();
        let exp = now.checked_add_signed(expiry).unwrap_or(if expiry < Duration::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
        Self {
            payload,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    /// The `email` claim, when the identity carried one.
    pub fn email(&self) -> Option<&str> {
        self.payload.get("email").and_then(Value::as_str)
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid token expiry: {0}")]
    InvalidExpiry(String),

    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// Token lifetime must be positive and keep `now + expiry` a valid timestamp.
fn expiry_from_hours(hours: u64) -> Result<Duration, JwtError> {
    if hours == 0 {
        return Err(JwtError::InvalidExpiry("expiry must be at least one hour".to_string()));
    }
    i64::try_from(hours)
        .ok()
        .and_then(Duration::try_hours)
        .filter(|expiry| Utc::now().checked_add_signed(*expiry).is_some())
        .ok_or_else(|| JwtError::InvalidExpiry(format!("{} hours is out of range", hours)))
}

/// Signs and verifies HS256 bearer tokens with the server secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let expiry = expiry_from_hours(expiry_hours)?;
        // Claims are caller-defined, so an `aud` in them must not fail verification.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry,
        })
    }

    /// Sign an arbitrary JSON object. No credential check happens here; the
    /// caller is trusted to have established identity already.
    pub fn issue(&self, payload: Value) -> Result<String, JwtError> {
        let Value::Object(payload) = payload else {
            return Err(JwtError::InvalidClaims("token payload must be a JSON object".to_string()));
        };
        self.sign(&Claims::new(payload, self.expiry))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Check signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(TokenService::new("", 4), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn out_of_range_expiry_is_rejected() {
        assert!(matches!(TokenService::new("s", 0), Err(JwtError::InvalidExpiry(_))));
        assert!(matches!(TokenService::new("s", u64::MAX), Err(JwtError::InvalidExpiry(_))));
        assert!(matches!(TokenService::new("s", 10_000_000_000), Err(JwtError::InvalidExpiry(_))));
        assert!(TokenService::new("s", 24 * 365).is_ok());
    }

    #[test]
    fn claims_saturate_instead_of_overflowing() {
        let claims = Claims::new(Map::new(), Duration::MAX);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn issued_token_verifies_with_claims() {
        let tokens = TokenService::new("test-secret", 4).unwrap();
        let token = tokens.issue(json!({"email": "ana@example.com", "name": "Ana"})).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.email(), Some("ana@example.com"));
        assert_eq!(claims.payload["name"], json!("Ana"));
        assert_eq!(claims.exp - claims.iat, 4 * 3600);
    }

    #[test]
    fn reserved_claims_are_replaced() {
        let tokens = TokenService::new("test-secret", 1).unwrap();
        let token = tokens.issue(json!({"email": "a@x.io", "exp": 1})).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert!(claims.exp > Utc::now().timestamp());
        assert!(!claims.payload.contains_key("exp"));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let tokens = TokenService::new("test-secret", 1).unwrap();
        assert!(matches!(tokens.issue(json!("a@x.io")), Err(JwtError::InvalidClaims(_))));
    }

    #[test]
    fn wrong_secret_and_expired_tokens_fail() {
        let tokens = TokenService::new("test-secret", 1).unwrap();
        let other = TokenService::new("other-secret", 1).unwrap();
        let token = other.issue(json!({"email": "a@x.io"})).unwrap();
        assert!(matches!(tokens.verify(&token), Err(JwtError::InvalidToken(_))));

        let expired = Claims::new(Map::new(), Duration::hours(-2));
        let token = tokens.sign(&expired).unwrap();
        assert!(matches!(tokens.verify(&token), Err(JwtError::InvalidToken(_))));

        assert!(tokens.verify("not.a.token").is_err());
    }
}
