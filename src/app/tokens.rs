use anyhow::{anyhow, Result};
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::TokenConfig;

const ISSUER: &str = "quill";
const AUDIENCE: &str = "quill";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_claim(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Encrypts and decrypts PASETO v4.local tokens for user sessions.
#[derive(Clone)]
pub struct TokenIssuer {
    access_key: [u8; 32],
    refresh_key: [u8; 32],
    access_ttl_minutes: u64,
    refresh_ttl_days: u64,
}

impl TokenIssuer {
    pub fn new(
        access_key: [u8; 32],
        refresh_key: [u8; 32],
        access_ttl_minutes: u64,
        refresh_ttl_days: u64,
    ) -> Self {
        Self {
            access_key,
            refresh_key,
            access_ttl_minutes,
            refresh_ttl_days,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(
            config.access_key,
            config.refresh_key,
            config.access_ttl_minutes,
            config.refresh_ttl_days,
        )
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<IssuedToken> {
        let duration = std::time::Duration::from_secs(self.access_ttl_minutes * 60);
        let claims = base_claims(&duration, user_id, TokenKind::Access)?;
        let token = encrypt(&self.access_key, &claims)?;
        Ok(IssuedToken {
            token,
            expires_at: OffsetDateTime::now_utc() + Duration::minutes(self.access_ttl_minutes as i64),
        })
    }

    pub fn issue_refresh(&self, user_id: Uuid, refresh_id: Uuid) -> Result<IssuedToken> {
        let duration = std::time::Duration::from_secs(self.refresh_ttl_days * 24 * 60 * 60);
        let mut claims = base_claims(&duration, user_id, TokenKind::Refresh)?;
        claims.token_identifier(&refresh_id.to_string())?;
        let token = encrypt(&self.refresh_key, &claims)?;
        Ok(IssuedToken {
            token,
            expires_at: OffsetDateTime::now_utc() + Duration::days(self.refresh_ttl_days as i64),
        })
    }

    /// Returns the user id of a valid, unexpired access token.
    pub fn verify_access(&self, token: &str) -> Result<Option<Uuid>> {
        let claims = match decrypt_claims(token, &self.access_key)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        if !has_token_type(&claims, TokenKind::Access) {
            return Ok(None);
        }
        Ok(Some(claim_uuid(&claims, "sub")?))
    }

    /// Returns `(user_id, refresh_id)` of a valid, unexpired refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Option<(Uuid, Uuid)>> {
        let claims = match decrypt_claims(token, &self.refresh_key)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        if !has_token_type(&claims, TokenKind::Refresh) {
            return Ok(None);
        }
        let user_id = claim_uuid(&claims, "sub")?;
        let refresh_id = claim_uuid(&claims, "jti")?;
        Ok(Some((user_id, refresh_id)))
    }
}

fn base_claims(duration: &std::time::Duration, user_id: Uuid, kind: TokenKind) -> Result<Claims> {
    let mut claims = Claims::new_expires_in(duration)?;
    claims.issuer(ISSUER)?;
    claims.audience(AUDIENCE)?;
    claims.subject(&user_id.to_string())?;
    claims.add_additional("typ", kind.as_claim())?;
    Ok(claims)
}

fn encrypt(key_bytes: &[u8; 32], claims: &Claims) -> Result<String> {
    let key = SymmetricKey::<V4>::from(key_bytes)?;
    Ok(local::encrypt(&key, claims, None, None)?)
}

fn decrypt_claims(token: &str, key_bytes: &[u8; 32]) -> Result<Option<Claims>> {
    let key = SymmetricKey::<V4>::from(key_bytes)?;
    let mut rules = ClaimsValidationRules::new();
    rules.validate_issuer_with(ISSUER);
    rules.validate_audience_with(AUDIENCE);

    let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
        Ok(token) => token,
        Err(_) => return Ok(None),
    };
    let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
        Ok(token) => token,
        Err(_) => return Ok(None),
    };
    Ok(trusted.payload_claims().cloned())
}

fn claim_uuid(claims: &Claims, name: &str) -> Result<Uuid> {
    let value = claims
        .get_claim(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing {} claim", name))?;
    Ok(Uuid::parse_str(value)?)
}

fn has_token_type(claims: &Claims, expected: TokenKind) -> bool {
    claims
        .get_claim("typ")
        .and_then(|value| value.as_str())
        .map(|value| value == expected.as_claim())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new([1u8; 32], [2u8; 32], 15, 30)
    }

    #[test]
    fn access_token_recovers_user_id() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let issued = issuer.issue_access(user_id).unwrap();
        assert!(issued.token.starts_with("v4.local."));
        assert_eq!(issuer.verify_access(&issued.token).unwrap(), Some(user_id));
    }

    #[test]
    fn refresh_token_recovers_ids() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let refresh_id = Uuid::new_v4();
        let issued = issuer.issue_refresh(user_id, refresh_id).unwrap();
        assert_eq!(
            issuer.verify_refresh(&issued.token).unwrap(),
            Some((user_id, refresh_id))
        );
    }

    #[test]
    fn other_secret_fails() {
        let user_id = Uuid::new_v4();
        let issued = issuer().issue_access(user_id).unwrap();
        let other = TokenIssuer::new([9u8; 32], [2u8; 32], 15, 30);
        assert_eq!(other.verify_access(&issued.token).unwrap(), None);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        // Same key for both kinds so only the typ claim tells them apart.
        let issuer = TokenIssuer::new([3u8; 32], [3u8; 32], 15, 30);
        let user_id = Uuid::new_v4();
        let refresh = issuer.issue_refresh(user_id, Uuid::new_v4()).unwrap();
        let access = issuer.issue_access(user_id).unwrap();
        assert_eq!(issuer.verify_access(&refresh.token).unwrap(), None);
        assert_eq!(issuer.verify_refresh(&access.token).unwrap(), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(issuer().verify_access("not-a-token").unwrap(), None);
    }

    #[test]
    fn access_expiry_follows_ttl() {
        let before = OffsetDateTime::now_utc();
        let issued = issuer().issue_access(Uuid::new_v4()).unwrap();
        let ttl = issued.expires_at - before;
        assert!(ttl <= Duration::minutes(15) + Duration::seconds(5));
        assert!(ttl >= Duration::minutes(14));
    }
}
