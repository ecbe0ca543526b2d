use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Session claims issued by the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_subject(sub: impl Into<String>, expires_in: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: sub.into(),
            exp: (now + Duration::seconds(expires_in)).timestamp(),
            iat: now.timestamp(),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs claims with the shared secret. Tokens are normally minted by the
    /// identity provider; this is kept for tooling and tests.
    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_session_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.sub.trim().is_empty() {
            return Err(AppError::AuthError("Token has no subject".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let jwt = JwtService::new("test-secret");
        let mut claims = Claims::for_subject("user-42", 3600);
        claims.email = Some("fan@example.com".into());

        let token = jwt.sign(&claims).unwrap();
        let decoded = jwt.verify_session_token(&token).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_rejects_foreign_secret() {
        let token = JwtService::new("other")
            .sign(&Claims::for_subject("user-42", 3600))
            .unwrap();
        assert!(JwtService::new("test-secret").verify_token(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let jwt = JwtService::new("test-secret");
        let token = jwt.sign(&Claims::for_subject("user-42", -3600)).unwrap();
        assert!(jwt.verify_session_token(&token).is_err());
    }

    #[test]
    fn test_rejects_empty_subject() {
        let jwt = JwtService::new("test-secret");
        let token = jwt.sign(&Claims::for_subject("", 3600)).unwrap();
        assert!(matches!(
            jwt.verify_session_token(&token),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_role_claim_is_ignored() {
        let now = Utc::now().timestamp();
        let payload = serde_json::json!({
            "sub": "user-42",
            "role": "admin",
            "exp": now + 3600,
            "iat": now,
        });
        let token = encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let claims = JwtService::new("test-secret")
            .verify_session_token(&token)
            .unwrap();
        assert_eq!(claims.sub, "user-42");
    }
}
