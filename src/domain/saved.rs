use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::post::Post;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A saved post together with the post it points at.
#[derive(Debug, Clone, Serialize)]
pub struct SavedPostEntry {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
    pub post: Post,
}
