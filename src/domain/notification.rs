use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_handle: Option<String>,
    pub receiver_id: Uuid,
    pub post_id: Option<Uuid>,
    pub notification_type: NotificationType,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Like,
    Comment,
}

impl NotificationType {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "like" => Some(Self::Like),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_names_round_trip() {
        for kind in [NotificationType::Like, NotificationType::Comment] {
            assert_eq!(NotificationType::from_db(kind.as_db()), Some(kind));
        }
        assert_eq!(NotificationType::from_db("follow"), None);
    }

    #[test]
    fn serializes_as_snake_case() {
        let value = serde_json::to_value(NotificationType::Comment).unwrap();
        assert_eq!(value, serde_json::json!("comment"));
    }
}
