//! Optimistic membership status.
//!
//! A response the user just gave is shown immediately. Every polled snapshot
//! is passed through [`MembershipOverlay::apply`], which keeps showing the
//! optimistic status while the request is in flight. The entry ends when the
//! server answers the request, when a snapshot agrees with it, or when the
//! program moves to a newer revision than the one it was first laid over.

use chrono::{DateTime, Utc};
use domain::models::{MembershipStatus, Program};
use domain::services::Versioned;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: MembershipStatus,
    /// Revision of the program when the entry was first applied.
    seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct MembershipOverlay {
    user_id: Uuid,
    optimistic: HashMap<Uuid, Entry>,
}

impl MembershipOverlay {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            optimistic: HashMap::new(),
        }
    }

    pub fn set(&mut self, program_id: Uuid, status: MembershipStatus) {
        self.optimistic.insert(program_id, Entry { status, seen: None });
    }

    /// Drops the optimistic status after a failed action so the last server
    /// state shows again.
    pub fn rollback(&mut self, program_id: Uuid) {
        self.optimistic.remove(&program_id);
    }

    /// Retires the entry once the server has answered with the program.
    ///
    /// Returns false when the server state differs from the optimistic one.
    pub fn settle(&mut self, program: &Program) -> bool {
        let Some(entry) = self.optimistic.remove(&program.id) else {
            return true;
        };
        program.status_of(self.user_id) == Some(entry.status)
    }

    pub fn status(&self, program_id: Uuid) -> Option<MembershipStatus> {
        self.optimistic.get(&program_id).map(|e| e.status)
    }

    pub fn is_empty(&self) -> bool {
        self.optimistic.is_empty()
    }

    /// Overlays optimistic statuses onto a snapshot.
    pub fn apply(&mut self, programs: &mut [Program]) {
        if self.optimistic.is_empty() {
            return;
        }
        for program in programs.iter_mut() {
            let program_id = program.id;
            let version = program.version();
            let Some(entry) = self.optimistic.get_mut(&program_id) else {
                continue;
            };
            let Some(membership) = program.membership_mut(self.user_id) else {
                continue;
            };

            if membership.status == entry.status {
                self.optimistic.remove(&program_id);
                continue;
            }
            let seen = entry.seen;
            match seen {
                Some(seen) if seen != version => {
                    debug!(
                        program_id = %program_id,
                        "Program changed under optimistic status, dropping it"
                    );
                    self.optimistic.remove(&program_id);
                }
                _ => {
                    entry.seen = Some(version);
                    membership.status = entry.status;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::{CreateProgramRequest, EntryRef, MembershipAction, WorkoutEntry};

    fn program_with_member(member: Uuid) -> Program {
        let request = CreateProgramRequest {
            group_id: Some(Uuid::new_v4()),
            name: "Morning run".to_string(),
            description: "Easy pace".to_string(),
            workouts: vec![WorkoutEntry {
                workout: EntryRef::Custom {
                    name: "Stretch".to_string(),
                    category: None,
                },
                sets: vec![],
                notes: None,
            }],
            geo_activities: vec![],
        };
        Program::new(Uuid::new_v4(), request.group_id, request, &[member], Utc::now())
    }

    #[test]
    fn test_optimistic_status_shown_until_server_agrees() {
        let user = Uuid::new_v4();
        let mut programs = vec![program_with_member(user)];
        let program_id = programs[0].id;

        let mut overlay = MembershipOverlay::new(user);
        overlay.set(program_id, MembershipStatus::Accepted);

        overlay.apply(&mut programs);
        assert_eq!(programs[0].status_of(user), Some(MembershipStatus::Accepted));
        assert_eq!(overlay.status(program_id), Some(MembershipStatus::Accepted));

        // Server now reports accepted too.
        let mut confirmed = programs.clone();
        overlay.apply(&mut confirmed);
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_rollback_restores_server_state() {
        let user = Uuid::new_v4();
        let program = program_with_member(user);
        let mut overlay = MembershipOverlay::new(user);

        overlay.set(program.id, MembershipStatus::Declined);
        overlay.rollback(program.id);

        let mut programs = vec![program];
        overlay.apply(&mut programs);
        assert_eq!(programs[0].status_of(user), Some(MembershipStatus::Pending));
    }

    #[test]
    fn test_programs_without_membership_untouched() {
        let user = Uuid::new_v4();
        let mut programs = vec![program_with_member(Uuid::new_v4())];
        let mut overlay = MembershipOverlay::new(user);
        overlay.set(programs[0].id, MembershipStatus::Accepted);

        overlay.apply(&mut programs);
        assert_eq!(programs[0].status_of(user), None);
        assert!(!overlay.is_empty());
    }

    #[test]
    fn test_server_answer_retires_entry() {
        let user = Uuid::new_v4();
        let mut program = program_with_member(user);
        let mut overlay = MembershipOverlay::new(user);
        overlay.set(program.id, MembershipStatus::Accepted);

        program
            .membership_mut(user)
            .unwrap()
            .respond(MembershipAction::Accept, Utc::now())
            .unwrap();
        assert!(overlay.settle(&program));
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_reinvite_after_accept_shows_server_status() {
        let user = Uuid::new_v4();
        let mut program = program_with_member(user);
        let mut overlay = MembershipOverlay::new(user);

        // Accepted from a list the program then leaves.
        overlay.set(program.id, MembershipStatus::Accepted);
        overlay.apply(&mut []);
        let now = Utc::now();
        program
            .membership_mut(user)
            .unwrap()
            .respond(MembershipAction::Accept, now)
            .unwrap();
        overlay.settle(&program);

        // The owner re-invites; later polls must show pending.
        program.membership_mut(user).unwrap().reinvite(now);
        program.updated_at = now + chrono::Duration::seconds(1);
        for _ in 0..3 {
            let mut snapshot = vec![program.clone()];
            overlay.apply(&mut snapshot);
            assert_eq!(snapshot[0].status_of(user), Some(MembershipStatus::Pending));
        }
    }

    #[test]
    fn test_newer_revision_drops_unanswered_entry() {
        let user = Uuid::new_v4();
        let mut program = program_with_member(user);
        let mut overlay = MembershipOverlay::new(user);
        overlay.set(program.id, MembershipStatus::Declined);

        let mut first = vec![program.clone()];
        overlay.apply(&mut first);
        assert_eq!(first[0].status_of(user), Some(MembershipStatus::Declined));

        // Same revision again keeps the optimistic status.
        let mut again = vec![program.clone()];
        overlay.apply(&mut again);
        assert_eq!(again[0].status_of(user), Some(MembershipStatus::Declined));

        program.updated_at += chrono::Duration::seconds(5);
        let mut moved = vec![program];
        overlay.apply(&mut moved);
        assert_eq!(moved[0].status_of(user), Some(MembershipStatus::Pending));
        assert!(overlay.is_empty());
    }
}
