//! Chat message entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ChatMessage, MessagePayload};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the chat_messages table.
#[derive(Debug, Clone, FromRow)]
pub struct ChatMessageEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub payload: Json<MessagePayload>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatMessageEntity> for ChatMessage {
    fn from(entity: ChatMessageEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            sender_id: entity.sender_id,
            text: entity.text,
            payload: entity.payload.0,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
