//! In-memory implementations of the storage and collaborator traits.
//!
//! Used by tests and by the `memory` database backend. Each store guards its
//! state with a tokio `RwLock`, so `modify` holds the write lock for the whole
//! read-modify-write step.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::collaborators::{CatalogSource, ChatService, GroupRoster};
use super::store::{EditOutcome, ProgramEdit, ProgramStore, SessionLogStore};
use crate::error::{DomainError, DomainResult};
use crate::models::{
    now_micros, ChatMessage, GeoActivity, MembershipStatus, OutgoingMessage, Program, SessionLog,
    Workout,
};

#[derive(Debug, Default)]
pub struct InMemoryProgramStore {
    programs: RwLock<HashMap<Uuid, Program>>,
}

impl InMemoryProgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect<F>(&self, filter: F) -> Vec<Program>
    where
        F: Fn(&Program) -> bool,
    {
        let programs = self.programs.read().await;
        let mut found: Vec<Program> = programs.values().filter(|p| filter(p)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        found
    }
}

#[async_trait]
impl ProgramStore for InMemoryProgramStore {
    async fn insert(&self, program: &Program) -> DomainResult<()> {
        let mut programs = self.programs.write().await;
        if programs.contains_key(&program.id) {
            return Err(DomainError::Storage(format!(
                "Program {} already exists",
                program.id
            )));
        }
        programs.insert(program.id, program.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Program>> {
        Ok(self.programs.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Program>> {
        let programs = self.programs.read().await;
        Ok(ids.iter().filter_map(|id| programs.get(id).cloned()).collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Program>> {
        Ok(self
            .collect(|p| p.owner_id == user_id || p.membership(user_id).is_some())
            .await)
    }

    async fn list_for_group(&self, group_id: Uuid) -> DomainResult<Vec<Program>> {
        Ok(self.collect(|p| p.group_id == Some(group_id)).await)
    }

    async fn list_pending_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Program>> {
        Ok(self
            .collect(|p| {
                p.membership(user_id)
                    .is_some_and(|m| m.status == MembershipStatus::Pending)
            })
            .await)
    }

    async fn modify(&self, id: Uuid, edit: &ProgramEdit<'_>) -> DomainResult<EditOutcome> {
        let mut programs = self.programs.write().await;
        let stored = programs.get_mut(&id).ok_or_else(DomainError::program_not_found)?;

        let mut working = stored.clone();
        let changed = edit(&mut working)?;
        if changed {
            *stored = working.clone();
        }
        Ok(EditOutcome {
            program: working,
            changed,
        })
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.programs.write().await.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionLogStore {
    logs: RwLock<Vec<SessionLog>>,
}

impl InMemorySessionLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionLogStore for InMemorySessionLogStore {
    async fn record(&self, log: &SessionLog) -> DomainResult<()> {
        self.logs.write().await.push(log.clone());
        Ok(())
    }

    async fn list_for_program(&self, program_id: Uuid) -> DomainResult<Vec<SessionLog>> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .filter(|l| l.program_id == program_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryGroupRoster {
    groups: RwLock<HashMap<Uuid, Vec<Uuid>>>,
}

impl InMemoryGroupRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster of a group.
    pub async fn set_members(&self, group_id: Uuid, members: Vec<Uuid>) {
        self.groups.write().await.insert(group_id, members);
    }

    pub async fn add_member(&self, group_id: Uuid, user_id: Uuid) {
        let mut groups = self.groups.write().await;
        let members = groups.entry(group_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }
    }
}

#[async_trait]
impl GroupRoster for InMemoryGroupRoster {
    async fn members(&self, group_id: Uuid) -> DomainResult<Vec<Uuid>> {
        Ok(self
            .groups
            .read()
            .await
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Chat service keeping messages in memory.
///
/// `set_failing(true)` makes sends fail so callers can exercise their error paths.
#[derive(Debug, Default)]
pub struct InMemoryChatService {
    messages: RwLock<Vec<ChatMessage>>,
    failing: AtomicBool,
}

impl InMemoryChatService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let service = Self::default();
        service.set_failing(true);
        service
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatService for InMemoryChatService {
    async fn send_message(&self, message: OutgoingMessage) -> DomainResult<ChatMessage> {
        if self.failing.load(Ordering::SeqCst) {
            tracing::warn!(group_id = %message.group_id, "In-memory chat simulating send failure");
            return Err(DomainError::Storage("Chat service unavailable".to_string()));
        }

        let now = now_micros();
        let stored = ChatMessage {
            id: Uuid::new_v4(),
            group_id: message.group_id,
            sender_id: message.sender_id,
            text: message.text,
            payload: message.payload,
            created_at: now,
            updated_at: now,
        };
        self.messages.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn fetch_messages(&self, group_id: Uuid) -> DomainResult<Vec<ChatMessage>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }
}

/// Catalog held in memory. Counts fetches so cache behaviour is observable.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    workouts: RwLock<Vec<Workout>>,
    geo_activities: RwLock<Vec<GeoActivity>>,
    fetches: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new(workouts: Vec<Workout>, geo_activities: Vec<GeoActivity>) -> Self {
        Self {
            workouts: RwLock::new(workouts),
            geo_activities: RwLock::new(geo_activities),
            fetches: AtomicUsize::new(0),
        }
    }

    pub async fn push_workout(&self, workout: Workout) {
        self.workouts.write().await.push(workout);
    }

    /// Number of `workouts` plus `geo_activities` calls served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn workouts(&self) -> DomainResult<Vec<Workout>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.workouts.read().await.clone())
    }

    async fn geo_activities(&self) -> DomainResult<Vec<GeoActivity>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.geo_activities.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProgramRequest, EntryRef, MembershipAction, WorkoutEntry};
    use std::sync::Arc;

    fn program(owner: Uuid, group: Option<Uuid>, invitees: &[Uuid]) -> Program {
        let req = CreateProgramRequest {
            group_id: group,
            name: "Core".to_string(),
            description: "Planks".to_string(),
            workouts: vec![WorkoutEntry {
                workout: EntryRef::Custom {
                    name: "Plank".to_string(),
                    category: None,
                },
                sets: vec![],
                notes: None,
            }],
            geo_activities: vec![],
        };
        Program::new(owner, group, req, invitees, now_micros())
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let store = InMemoryProgramStore::new();
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let group = Uuid::new_v4();
        let p = program(owner, Some(group), &[member]);
        store.insert(&p).await.unwrap();

        assert!(store.insert(&p).await.is_err());
        assert_eq!(store.list_for_user(owner).await.unwrap().len(), 1);
        assert_eq!(store.list_for_user(member).await.unwrap().len(), 1);
        assert_eq!(store.list_pending_for_user(member).await.unwrap().len(), 1);
        assert!(store.list_pending_for_user(owner).await.unwrap().is_empty());
        assert_eq!(store.list_for_group(group).await.unwrap().len(), 1);
        assert!(store.list_for_user(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_modify_skips_write_when_unchanged() {
        let store = InMemoryProgramStore::new();
        let p = program(Uuid::new_v4(), None, &[]);
        store.insert(&p).await.unwrap();

        let outcome = store
            .modify(p.id, &|prog: &mut Program| {
                prog.name = "Discarded".to_string();
                Ok(false)
            })
            .await
            .unwrap();
        assert!(!outcome.changed);
        let stored = store.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Core");
    }

    #[tokio::test]
    async fn test_modify_error_leaves_state() {
        let store = InMemoryProgramStore::new();
        let p = program(Uuid::new_v4(), None, &[]);
        store.insert(&p).await.unwrap();

        let result = store
            .modify(p.id, &|prog: &mut Program| {
                prog.name = "Broken".to_string();
                Err(DomainError::Forbidden("no".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.find_by_id(p.id).await.unwrap().unwrap(), p);

        let missing = store.modify(Uuid::new_v4(), &|_: &mut Program| Ok(true)).await;
        assert!(matches!(missing, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_accepts_never_duplicate() {
        let store = Arc::new(InMemoryProgramStore::new());
        let member = Uuid::new_v4();
        let p = program(Uuid::new_v4(), Some(Uuid::new_v4()), &[member]);
        store.insert(&p).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let id = p.id;
            handles.push(tokio::spawn(async move {
                store
                    .modify(id, &|prog: &mut Program| {
                        let now = now_micros();
                        let m = prog.membership_mut(member).unwrap();
                        Ok(m.respond(MembershipAction::Accept, now)?
                            == crate::models::Transition::Changed)
                    })
                    .await
                    .unwrap()
                    .changed
            }));
        }

        let mut changed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                changed += 1;
            }
        }
        assert_eq!(changed, 1);
        let stored = store.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.members.len(), 1);
        assert_eq!(stored.members[0].status, MembershipStatus::Accepted);
    }

    #[tokio::test]
    async fn test_delete_removes_program() {
        let store = InMemoryProgramStore::new();
        let p = program(Uuid::new_v4(), None, &[]);
        store.insert(&p).await.unwrap();
        assert!(store.delete(p.id).await.unwrap());
        assert!(!store.delete(p.id).await.unwrap());
        assert!(store.find_by_id(p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_roster_and_chat() {
        let roster = InMemoryGroupRoster::new();
        let group = Uuid::new_v4();
        let user = Uuid::new_v4();
        roster.add_member(group, user).await;
        roster.add_member(group, user).await;
        assert_eq!(roster.members(group).await.unwrap(), vec![user]);
        assert!(roster.members(Uuid::new_v4()).await.unwrap().is_empty());

        let chat = InMemoryChatService::new();
        let sent = chat
            .send_message(OutgoingMessage {
                group_id: group,
                sender_id: user,
                text: "hi".to_string(),
                payload: Default::default(),
            })
            .await
            .unwrap();
        assert_eq!(chat.fetch_messages(group).await.unwrap(), vec![sent]);

        chat.set_failing(true);
        assert!(chat
            .send_message(OutgoingMessage {
                group_id: group,
                sender_id: user,
                text: "lost".to_string(),
                payload: Default::default(),
            })
            .await
            .is_err());
    }
}
