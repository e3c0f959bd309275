use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_SEED_PASSWORD: &str = "password123";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub db: DbConfig,
    pub tokens: TokenConfig,
    pub admin_token: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

#[derive(Clone)]
pub struct TokenConfig {
    pub access_key: [u8; 32],
    pub refresh_key: [u8; 32],
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
}

// Keys stay out of logs.
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_key", &"<redacted>")
            .field("refresh_key", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        Ok(Self {
            http_addr,
            db: DbConfig::from_env()?,
            tokens: TokenConfig::from_env()?,
            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|token| !token.is_empty()),
        })
    }
}

impl DbConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env_or_err("DATABASE_URL")?,
            max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
            connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
        })
    }
}

impl TokenConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            access_key: env_key_32("PASETO_ACCESS_KEY")?,
            refresh_key: env_key_32("PASETO_REFRESH_KEY")?,
            access_ttl_minutes: env_or_parse("ACCESS_TTL_MINUTES", "15")?,
            refresh_ttl_days: env_or_parse("REFRESH_TTL_DAYS", "30")?,
        })
    }
}

/// Password given to the users created by `quill-admin reset`.
pub fn seed_password() -> String {
    env_or("SEED_PASSWORD", DEFAULT_SEED_PASSWORD)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn env_key_32(key: &str) -> Result<[u8; 32]> {
    let value = env_or_err(key)?;
    decode_key_32(key, &value)
}

pub(crate) fn decode_key_32(key: &str, value: &str) -> Result<[u8; 32]> {
    let decoded = STANDARD
        .decode(value.trim().as_bytes())
        .map_err(|err| anyhow!("invalid {}: {}", key, err))?;
    if decoded.len() != 32 {
        return Err(anyhow!("invalid {}: expected 32 bytes", key));
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&decoded);
    Ok(key_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_32_byte_key() {
        let encoded = STANDARD.encode([7u8; 32]);
        let key = decode_key_32("PASETO_ACCESS_KEY", &encoded).unwrap();
        assert_eq!(key, [7u8; 32]);
    }

    #[test]
    fn rejects_short_key() {
        let encoded = STANDARD.encode([7u8; 16]);
        let err = decode_key_32("PASETO_ACCESS_KEY", &encoded).unwrap_err();
        assert_eq!(err.to_string(), "invalid PASETO_ACCESS_KEY: expected 32 bytes");
    }

    #[test]
    fn rejects_non_base64_key() {
        assert!(decode_key_32("PASETO_REFRESH_KEY", "not base64!").is_err());
    }

    #[test]
    fn token_config_debug_hides_keys() {
        let config = TokenConfig {
            access_key: [1u8; 32],
            refresh_key: [2u8; 32],
            access_ttl_minutes: 15,
            refresh_ttl_days: 30,
        };
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("[1, 1"));
    }
}
