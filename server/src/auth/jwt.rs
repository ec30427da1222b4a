//! Access tokens: HS256 JWTs carrying the account's id, role and email.

use chrono::{DateTime, Duration, Utc};
use demoride_core::{Role, User, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID
    pub sub: UserId,
    /// Role at issue time
    pub role: Role,
    /// Login email
    pub email: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expires at (seconds since epoch)
    pub exp: i64,
}

/// Signs and verifies access tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    /// Keys for `secret`, issuing tokens valid for `ttl_seconds`.
    #[must_use]
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX / 1000)),
        }
    }

    /// Issue a token for `user`, valid from now.
    ///
    /// # Errors
    ///
    /// Fails if the claims cannot be signed.
    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token for `user` as if it were `issued_at`.
    ///
    /// # Errors
    ///
    /// Fails if the claims cannot be signed.
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user.id,
            role: user.role,
            email: user.email.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {e}"))
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Malformed, tampered or expired tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use demoride_core::LicenseClass;

    fn user(role: Role) -> User {
        User {
            id: UserId::new(),
            email: "rider@example.com".into(),
            first_name: "Sam".into(),
            last_name: "Rider".into(),
            phone: None,
            role,
            license: Some(LicenseClass::A2),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let keys = TokenKeys::new(b"secret", 3600);
        let user = user(Role::Dealer);

        let claims = keys.verify(&keys.issue(&user).unwrap()).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Dealer);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new(b"secret", 60);
        let token = keys
            .issue_at(&user(Role::Client), Utc::now() - Duration::hours(1))
            .unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenKeys::new(b"secret", 3600);
        let theirs = TokenKeys::new(b"other", 3600);
        let token = theirs.issue(&user(Role::Admin)).unwrap();

        assert!(ours.verify(&token).is_err());
    }
}
