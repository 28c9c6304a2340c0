//! Reconciliation of locally held entities with a freshly polled snapshot.
//!
//! Entities are matched by id, never by position. A local entity is replaced
//! only when the remote version differs, and the same id never appears twice.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::{ChatMessage, Program, ResolvedMessage};

/// An entity with a stable key and a version that changes on every mutation.
pub trait Versioned {
    fn key(&self) -> Uuid;
    fn version(&self) -> DateTime<Utc>;

    /// True when `other` is the same revision of this entity.
    fn same_revision(&self, other: &Self) -> bool {
        self.version() == other.version()
    }
}

impl Versioned for Program {
    fn key(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> DateTime<Utc> {
        self.last_edited_at
            .map_or(self.updated_at, |edited| edited.max(self.updated_at))
    }
}

impl Versioned for ChatMessage {
    fn key(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// A resolved message changes when either the message or its program does,
/// including the program disappearing.
impl Versioned for ResolvedMessage {
    fn key(&self) -> Uuid {
        self.message.id
    }

    fn version(&self) -> DateTime<Utc> {
        self.program
            .as_ref()
            .map_or(self.message.updated_at, |p| p.version().max(self.message.updated_at))
    }

    fn same_revision(&self, other: &Self) -> bool {
        self.message.updated_at == other.message.updated_at
            && self.program.as_ref().map(Versioned::version)
                == other.program.as_ref().map(Versioned::version)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<T> {
    pub items: Vec<T>,
    /// False when the merged view is identical to the local one.
    pub changed: bool,
}

/// Merges a remote snapshot into the local view.
///
/// The result follows the remote order. Entities whose version is unchanged
/// keep their local copy; duplicates in the snapshot are dropped.
pub fn merge<T: Versioned + Clone>(local: &[T], remote: Vec<T>) -> MergeOutcome<T> {
    let local_by_key: HashMap<Uuid, (usize, &T)> = local
        .iter()
        .enumerate()
        .map(|(i, item)| (item.key(), (i, item)))
        .collect();

    let mut seen = HashSet::with_capacity(remote.len());
    let mut items = Vec::with_capacity(remote.len());
    let mut changed = false;

    for incoming in remote {
        let key = incoming.key();
        if !seen.insert(key) {
            continue;
        }
        let position = items.len();
        match local_by_key.get(&key) {
            Some((index, existing)) if existing.same_revision(&incoming) => {
                changed |= *index != position;
                items.push((*existing).clone());
            }
            _ => {
                changed = true;
                items.push(incoming);
            }
        }
    }

    changed |= items.len() != local.len();
    MergeOutcome { items, changed }
}
