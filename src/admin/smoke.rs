use anyhow::{anyhow, bail, Result};
use uuid::Uuid;

use crate::app::tokens::TokenIssuer;
use crate::infra::db::Db;

/// Issues an access token for `user_id` and verifies it with the same keys.
/// Returns the user id recovered from the token.
pub fn auth_smoke_test(issuer: &TokenIssuer, user_id: Uuid) -> Result<Uuid> {
    let issued = issuer.issue_access(user_id)?;
    tracing::info!(%user_id, expires_at = %issued.expires_at, "issued access token");

    let recovered = issuer
        .verify_access(&issued.token)?
        .ok_or_else(|| anyhow!("freshly issued token failed verification"))?;
    if recovered != user_id {
        bail!("token subject mismatch: issued for {}, got {}", user_id, recovered);
    }

    tracing::info!(%recovered, "token verified");
    Ok(recovered)
}

pub async fn find_user_id(db: &Db, handle: &str) -> Result<Uuid> {
    let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE handle = $1")
        .bind(handle)
        .fetch_optional(db.pool())
        .await?;
    id.ok_or_else(|| anyhow!("no user with handle {}", handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_user_id() {
        let issuer = TokenIssuer::new([5u8; 32], [6u8; 32], 5, 1);
        let user_id = Uuid::new_v4();
        assert_eq!(auth_smoke_test(&issuer, user_id).unwrap(), user_id);
    }
}
