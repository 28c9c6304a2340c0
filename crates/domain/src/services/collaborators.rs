//! Interfaces of the services a program depends on but does not own.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::{ChatMessage, GeoActivity, OutgoingMessage, Workout};

/// Current group membership.
#[async_trait]
pub trait GroupRoster: Send + Sync {
    /// User ids currently in the group, owner included.
    async fn members(&self, group_id: Uuid) -> DomainResult<Vec<Uuid>>;
}

/// Group chat transport.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn send_message(&self, message: OutgoingMessage) -> DomainResult<ChatMessage>;

    /// Messages of a group chat, oldest first.
    async fn fetch_messages(&self, group_id: Uuid) -> DomainResult<Vec<ChatMessage>>;
}

/// Workout and geo-activity catalogs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn workouts(&self) -> DomainResult<Vec<Workout>>;

    async fn geo_activities(&self) -> DomainResult<Vec<GeoActivity>>;
}
