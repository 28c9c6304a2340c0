//! Chat messages and program announcements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::program::Program;

/// Structured part of a chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    #[default]
    Plain,
    ProgramAnnouncement {
        program_id: Uuid,
    },
}

impl MessagePayload {
    pub fn program_ref(&self) -> Option<Uuid> {
        match self {
            MessagePayload::Plain => None,
            MessagePayload::ProgramAnnouncement { program_id } => Some(*program_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub payload: MessagePayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Message handed to the chat service for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub group_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub payload: MessagePayload,
}

/// Announcement for a newly created program.
///
/// Consumers resolve the program through `program_ref`; `display_text` is for
/// people only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub program_ref: Uuid,
    pub display_text: String,
}

impl Announcement {
    pub fn into_message(self, group_id: Uuid, sender_id: Uuid) -> OutgoingMessage {
        OutgoingMessage {
            group_id,
            sender_id,
            text: self.display_text,
            payload: MessagePayload::ProgramAnnouncement {
                program_id: self.program_ref,
            },
        }
    }
}

/// A chat message with its announced program, when it still exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub program: Option<Program>,
}
