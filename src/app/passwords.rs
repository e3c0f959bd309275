use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Every PHC string produced by `hash_password` starts with this.
pub const ARGON2_PREFIX: &str = "$argon2";

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// True when `stored` is an Argon2 PHC string rather than a legacy plaintext value.
///
/// The prefix alone would accept a plaintext password that happens to start
/// with `$argon2`, so the value must also parse as an Argon2 PHC string that
/// carries a hash.
pub fn is_password_hashed(stored: &str) -> bool {
    if !stored.starts_with(ARGON2_PREFIX) {
        return false;
    }
    match PasswordHash::new(stored) {
        Ok(parsed) => {
            parsed.hash.is_some()
                && matches!(parsed.algorithm.as_str(), "argon2id" | "argon2i" | "argon2d")
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with(ARGON2_PREFIX));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn detects_hashed_values() {
        let hash = hash_password("secret").unwrap();
        assert!(is_password_hashed(&hash));
        assert!(!is_password_hashed("secret"));
        assert!(!is_password_hashed(""));
        assert!(!is_password_hashed("$argon2 but not really"));
        assert!(!is_password_hashed("$argon2-is-my-password"));
        assert!(!is_password_hashed("$argon2id"));
    }

    #[test]
    fn verify_rejects_plaintext_hash() {
        assert!(verify_password("secret", "secret").is_err());
    }
}
