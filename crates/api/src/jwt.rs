//! HS256 bearer token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use aidflow_auth::{JwtClaims, JwtValidator, TokenValidationError, validate_claims};

/// Verifies HS256 signatures with a shared secret, then checks the claim window.
///
/// The time window lives in our own `issued_at`/`expires_at` claims, so the
/// registered `exp` claim is neither required nor checked by the decoder.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use aidflow_auth::Role;
    use aidflow_core::UserId;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    fn mint(secret: &str, issued_at: DateTime<Utc>, ttl: Duration) -> (JwtClaims, String) {
        let claims = JwtClaims {
            sub: UserId::new(),
            role: Role::Volunteer,
            issued_at,
            expires_at: issued_at + ttl,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (claims, token)
    }

    #[test]
    fn accepts_a_token_signed_with_the_shared_secret() {
        let now = Utc::now();
        let (claims, token) = mint("s3cret", now, Duration::minutes(5));
        let validator = Hs256JwtValidator::new(b"s3cret".to_vec());
        assert_eq!(validator.validate(&token, now).unwrap(), claims);
    }

    #[test]
    fn rejects_wrong_secret_garbage_and_expired_tokens() {
        let now = Utc::now();
        let validator = Hs256JwtValidator::new(b"s3cret".to_vec());

        let (_, forged) = mint("other", now, Duration::minutes(5));
        assert!(matches!(validator.validate(&forged, now), Err(TokenValidationError::Malformed(_))));
        assert!(matches!(validator.validate("not.a.jwt", now), Err(TokenValidationError::Malformed(_))));

        let (_, stale) = mint("s3cret", now - Duration::hours(2), Duration::hours(1));
        assert_eq!(validator.validate(&stale, now), Err(TokenValidationError::Expired));
    }
}
