use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::app::{QuireError, Result};

/// Token lifetime in seconds used when the configuration does not override it.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    adm: bool,
    iat: i64,
    exp: i64,
}

/// Identity recovered from a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSubject {
    pub subject_id: i64,
    pub is_admin: bool,
}

/// Issues and validates HS256-signed session tokens.
///
/// The signing secret is fixed at construction. Rotating it means building a
/// new manager, which invalidates every outstanding token at once.
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenManager {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, subject_id: i64, is_admin: bool) -> Result<String> {
        self.issue_at(subject_id, is_admin, Utc::now())
    }

    pub fn issue_at(&self, subject_id: i64, is_admin: bool, now: DateTime<Utc>) -> Result<String> {
        let expiry = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| QuireError::TokenSigning("expiry out of range".to_string()))?;
        let claims = Claims {
            sub: subject_id.to_string(),
            adm: is_admin,
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| QuireError::TokenSigning(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<TokenSubject> {
        self.validate_at(token, Utc::now())
    }

    /// Verifies signature, algorithm and expiry against `now`.
    ///
    /// A token is accepted strictly before its `exp` instant and rejected from
    /// that instant on. Tokens declaring any algorithm other than HS256 are
    /// rejected.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenSubject> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => QuireError::Expired,
                _ => QuireError::InvalidToken,
            }
        })?;

        if now.timestamp() >= data.claims.exp {
            return Err(QuireError::Expired);
        }

        let subject_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| QuireError::InvalidToken)?;

        Ok(TokenSubject {
            subject_id,
            is_admin: data.claims.adm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn ttl() -> Duration {
        Duration::seconds(DEFAULT_TOKEN_TTL_SECS)
    }

    fn manager() -> TokenManager {
        TokenManager::new(SECRET, ttl())
    }

    #[test]
    fn test_issue_then_validate() {
        let tokens = manager();
        let token = tokens.issue(42, true).unwrap();
        let subject = tokens.validate(&token).unwrap();
        assert_eq!(
            subject,
            TokenSubject {
                subject_id: 42,
                is_admin: true
            }
        );

        let token = tokens.issue(7, false).unwrap();
        let subject = tokens.validate(&token).unwrap();
        assert_eq!(subject.subject_id, 7);
        assert!(!subject.is_admin);
    }

    #[test]
    fn test_expiry_boundary() {
        let tokens = manager();
        let issued = Utc::now();
        let token = tokens.issue_at(1, false, issued).unwrap();
        let expiry = DateTime::from_timestamp((issued + ttl()).timestamp(), 0).unwrap();

        assert!(tokens
            .validate_at(&token, expiry - Duration::seconds(1))
            .is_ok());
        assert!(matches!(
            tokens.validate_at(&token, expiry),
            Err(QuireError::Expired)
        ));
        assert!(matches!(
            tokens.validate_at(&token, expiry + Duration::seconds(1)),
            Err(QuireError::Expired)
        ));
    }

    #[test]
    fn test_already_expired_token_rejected_by_default_clock() {
        let tokens = manager();
        let token = tokens
            .issue_at(1, true, Utc::now() - Duration::hours(25))
            .unwrap();
        assert!(matches!(tokens.validate(&token), Err(QuireError::Expired)));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let tokens = TokenManager::new(SECRET, Duration::days(365 * 1_000_000));
        assert!(matches!(
            tokens.issue(1, false),
            Err(QuireError::TokenSigning(_))
        ));
    }

    #[test]
    fn test_different_secret_rejected() {
        let token = manager().issue(1, true).unwrap();
        let other = TokenManager::new(b"rotated-secret", ttl());
        assert!(matches!(other.validate(&token), Err(QuireError::InvalidToken)));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let tokens = manager();
        for bad in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(matches!(tokens.validate(bad), Err(QuireError::InvalidToken)));
        }
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = manager();
        let token = tokens.issue(1, false).unwrap();
        let admin = tokens.issue(1, true).unwrap();

        // Splice the admin payload onto the non-admin signature.
        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);
        assert!(matches!(tokens.validate(&forged), Err(QuireError::InvalidToken)));
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let claims = Claims {
            sub: "admin".into(),
            adm: true,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            manager().validate(&token),
            Err(QuireError::InvalidToken)
        ));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claims = Claims {
            sub: "1".into(),
            adm: true,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            manager().validate(&token),
            Err(QuireError::InvalidToken)
        ));
    }
}
