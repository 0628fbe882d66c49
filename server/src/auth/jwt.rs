use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::{Identity, Role};

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub, self.role)
    }
}

/// Signing material shared through application state
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }
}

/// Mint an access token for `user_id` acting as `role`
pub fn generate_access_token(
    keys: &JwtKeys,
    user_id: Uuid,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp(),
        exp: (now + keys.ttl).timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
}

/// Validate signature and expiry
pub fn verify_token(keys: &JwtKeys, token: &str) -> Result<Claims, DispatchError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &keys.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|e| DispatchError::Unauthorized(format!("invalid token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let keys = JwtKeys::new("test-secret", 1);
        let user = Uuid::new_v4();
        let token = generate_access_token(&keys, user, Role::Staff).unwrap();

        let claims = verify_token(&keys, &token).unwrap();
        assert_eq!(claims.identity(), Identity::new(user, Role::Staff));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = generate_access_token(&JwtKeys::new("a", 1), Uuid::new_v4(), Role::User).unwrap();
        assert!(matches!(
            verify_token(&JwtKeys::new("b", 1), &token),
            Err(DispatchError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = JwtKeys::new("test-secret", -2);
        let token = generate_access_token(&keys, Uuid::new_v4(), Role::Admin).unwrap();
        assert!(verify_token(&keys, &token).is_err());
    }
}
