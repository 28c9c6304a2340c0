//! Wires the program service to its configured storage backend.

use anyhow::Context;
use domain::services::{
    CatalogCache, InMemoryCatalog, InMemoryChatService, InMemoryGroupRoster, InMemoryProgramStore,
    InMemorySessionLogStore, ProgramService,
};
use persistence::db::{create_pool, run_migrations};
use persistence::repositories::{
    CatalogRepository, ChatMessageRepository, GroupMemberRepository, ProgramRepository,
    SessionRepository,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Config, DatabaseBackend};

/// Builds the service for `database.backend`.
///
/// The postgres path connects, runs pending migrations and uses the
/// repositories for every store and collaborator.
pub async fn build_program_service(config: &Config) -> anyhow::Result<ProgramService> {
    match config.database.backend {
        DatabaseBackend::Postgres => {
            let pool = create_pool(&(&config.database).into())
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database connected and migrations applied");

            let catalog = Arc::new(CatalogCache::new(
                Arc::new(CatalogRepository::new(pool.clone())),
                config.catalog.staleness(),
            ));
            Ok(ProgramService::new(
                Arc::new(ProgramRepository::new(pool.clone())),
                Arc::new(SessionRepository::new(pool.clone())),
                Arc::new(GroupMemberRepository::new(pool.clone())),
                Arc::new(ChatMessageRepository::new(pool)),
                catalog,
            ))
        }
        DatabaseBackend::Memory => {
            warn!("Using in-memory storage; group rosters are empty and data is lost on restart");
            Ok(InMemoryBackend::new(config).service)
        }
    }
}

/// In-memory service plus handles to its collaborators for seeding.
pub struct InMemoryBackend {
    pub service: ProgramService,
    pub roster: Arc<InMemoryGroupRoster>,
    pub chat: Arc<InMemoryChatService>,
    pub catalog: Arc<InMemoryCatalog>,
}

impl InMemoryBackend {
    pub fn new(config: &Config) -> Self {
        let roster = Arc::new(InMemoryGroupRoster::new());
        let chat = Arc::new(InMemoryChatService::new());
        let catalog = Arc::new(InMemoryCatalog::new(Vec::new(), Vec::new()));

        let service = ProgramService::new(
            Arc::new(InMemoryProgramStore::new()),
            Arc::new(InMemorySessionLogStore::new()),
            roster.clone(),
            chat.clone(),
            Arc::new(CatalogCache::new(catalog.clone(), config.catalog.staleness())),
        );
        Self {
            service,
            roster,
            chat,
            catalog,
        }
    }
}
