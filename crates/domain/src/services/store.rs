//! Storage seams for programs and session logs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::{Program, SessionLog};

/// A read-modify-write step applied to the latest stored program.
///
/// Returns `Ok(true)` when the program changed and must be written back.
pub type ProgramEdit<'a> = dyn Fn(&mut Program) -> DomainResult<bool> + Send + Sync + 'a;

/// Result of [`ProgramStore::modify`].
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub program: Program,
    pub changed: bool,
}

/// Source of truth for programs and their memberships.
///
/// Implementations apply `modify` atomically per program: the edit always sees
/// the latest stored state and no concurrent writer interleaves with it.
#[async_trait]
pub trait ProgramStore: Send + Sync {
    /// Inserts a program together with its memberships.
    async fn insert(&self, program: &Program) -> DomainResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Program>>;

    /// Programs with the given ids, in no particular order. Missing ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Program>>;

    /// Programs the user owns or holds a membership in, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Program>>;

    /// Programs of a group, newest first.
    async fn list_for_group(&self, group_id: Uuid) -> DomainResult<Vec<Program>>;

    /// Programs where the user's membership is pending, newest first.
    async fn list_pending_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Program>>;

    /// Applies `edit` atomically. Fails with `NotFound` when the program is missing.
    async fn modify(&self, id: Uuid, edit: &ProgramEdit<'_>) -> DomainResult<EditOutcome>;

    /// Deletes a program and its memberships. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> DomainResult<bool>;

    /// Readiness probe.
    async fn ping(&self) -> bool {
        true
    }
}

/// Externally produced session logs scoped to programs.
#[async_trait]
pub trait SessionLogStore: Send + Sync {
    async fn record(&self, log: &SessionLog) -> DomainResult<()>;

    async fn list_for_program(&self, program_id: Uuid) -> DomainResult<Vec<SessionLog>>;
}
