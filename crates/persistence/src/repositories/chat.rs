//! Chat message repository.

use async_trait::async_trait;
use domain::models::{ChatMessage, OutgoingMessage};
use domain::services::ChatService;
use domain::DomainResult;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ChatMessageEntity;
use crate::error::into_domain;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct ChatMessageRepository {
    pool: PgPool,
}

impl ChatMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatService for ChatMessageRepository {
    async fn send_message(&self, message: OutgoingMessage) -> DomainResult<ChatMessage> {
        let timer = QueryTimer::new("insert_chat_message");
        let result = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            INSERT INTO chat_messages (group_id, sender_id, text, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING id, group_id, sender_id, text, payload, created_at, updated_at
            "#,
        )
        .bind(message.group_id)
        .bind(message.sender_id)
        .bind(&message.text)
        .bind(Json(&message.payload))
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result.map(ChatMessage::from).map_err(into_domain)
    }

    async fn fetch_messages(&self, group_id: Uuid) -> DomainResult<Vec<ChatMessage>> {
        let timer = QueryTimer::new("list_chat_messages");
        let result = sqlx::query_as::<_, ChatMessageEntity>(
            r#"
            SELECT id, group_id, sender_id, text, payload, created_at, updated_at
            FROM chat_messages
            WHERE group_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(into_domain)?
            .into_iter()
            .map(ChatMessage::from)
            .collect())
    }
}
