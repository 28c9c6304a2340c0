//! Program service: the operations exposed for programs and their memberships.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::announcement::{build_announcement, resolve_messages};
use super::catalog_cache::CatalogCache;
use super::collaborators::{ChatService, GroupRoster};
use super::progress::aggregate_progress;
use super::store::{ProgramStore, SessionLogStore};
use crate::error::{DomainError, DomainResult};
use crate::models::{
    now_micros, ChatMessage, CreateProgramRequest, GeoActivity, GroupProgramProgress, Membership,
    MembershipAction, MoveEntryRequest, Program, RecordSessionRequest, ResolvedMessage,
    SessionLog, Transition, UpdateProgramRequest, Workout,
};

/// Result of a state-changing call that may be a no-op.
#[derive(Debug, Clone)]
pub struct Applied {
    pub program: Program,
    pub changed: bool,
}

#[derive(Clone)]
pub struct ProgramService {
    programs: Arc<dyn ProgramStore>,
    sessions: Arc<dyn SessionLogStore>,
    roster: Arc<dyn GroupRoster>,
    chat: Arc<dyn ChatService>,
    catalog: Arc<CatalogCache>,
}

impl ProgramService {
    pub fn new(
        programs: Arc<dyn ProgramStore>,
        sessions: Arc<dyn SessionLogStore>,
        roster: Arc<dyn GroupRoster>,
        chat: Arc<dyn ChatService>,
        catalog: Arc<CatalogCache>,
    ) -> Self {
        Self {
            programs,
            sessions,
            roster,
            chat,
            catalog,
        }
    }

    pub async fn ping(&self) -> bool {
        self.programs.ping().await
    }

    /// Creates a program and invites every other current group member.
    ///
    /// The announcement is sent after the program is stored. A failed send is
    /// logged and does not undo the program.
    pub async fn create(&self, owner_id: Uuid, request: CreateProgramRequest) -> DomainResult<Program> {
        request.validate_all()?;
        self.ensure_catalog_refs(
            request.workouts.iter().filter_map(|w| w.workout.catalog_id()),
            request.geo_activities.iter().filter_map(|g| g.activity.catalog_id()),
        )
        .await?;

        let group_id = request.group_id;
        let invitees = match group_id {
            Some(group_id) => {
                let roster = self.roster.members(group_id).await?;
                if !roster.contains(&owner_id) {
                    return Err(DomainError::Forbidden(
                        "Only group members can create a program for the group".to_string(),
                    ));
                }
                roster
            }
            None => Vec::new(),
        };

        let program = Program::new(owner_id, group_id, request, &invitees, now_micros());
        self.programs.insert(&program).await?;

        info!(
            program_id = %program.id,
            owner_id = %owner_id,
            group_id = ?group_id,
            invited = program.members.len(),
            "Program created"
        );

        if let Some(group_id) = group_id {
            if let Err(e) = self.announce(&program, group_id).await {
                warn!(
                    program_id = %program.id,
                    group_id = %group_id,
                    error = %e,
                    "Failed to send program announcement"
                );
            }
        }

        Ok(program)
    }

    async fn announce(&self, program: &Program, group_id: Uuid) -> DomainResult<ChatMessage> {
        let workouts = catalog_or_empty(self.catalog.workouts(false).await);
        let geo = catalog_or_empty(self.catalog.geo_activities(false).await);
        let announcement = build_announcement(program, &workouts, &geo);
        self.chat
            .send_message(announcement.into_message(group_id, program.owner_id))
            .await
    }

    async fn ensure_catalog_refs(
        &self,
        workout_ids: impl Iterator<Item = Uuid>,
        geo_ids: impl Iterator<Item = Uuid>,
    ) -> DomainResult<()> {
        let workout_ids: Vec<Uuid> = workout_ids.collect();
        let geo_ids: Vec<Uuid> = geo_ids.collect();
        self.catalog.ensure_known(&workout_ids, &geo_ids).await
    }

    /// Loads a program the viewer is allowed to see.
    pub async fn get(&self, program_id: Uuid, viewer_id: Uuid) -> DomainResult<Program> {
        let program = self.load(program_id).await?;
        self.ensure_can_view(&program, viewer_id).await?;
        Ok(program)
    }

    async fn load(&self, program_id: Uuid) -> DomainResult<Program> {
        self.programs
            .find_by_id(program_id)
            .await?
            .ok_or_else(DomainError::program_not_found)
    }

    async fn ensure_can_view(&self, program: &Program, viewer_id: Uuid) -> DomainResult<()> {
        if program.is_participant(viewer_id) {
            return Ok(());
        }
        if let Some(group_id) = program.group_id {
            if self.roster.members(group_id).await?.contains(&viewer_id) {
                return Ok(());
            }
        }
        Err(DomainError::Forbidden(
            "You do not have access to this program".to_string(),
        ))
    }

    /// Fails with `Forbidden` unless the user is currently in the group.
    pub async fn ensure_group_member(&self, group_id: Uuid, user_id: Uuid) -> DomainResult<()> {
        if self.roster.members(group_id).await?.contains(&user_id) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(
                "You are not a member of this group".to_string(),
            ))
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Program>> {
        self.programs.list_for_user(user_id).await
    }

    pub async fn list_pending(&self, user_id: Uuid) -> DomainResult<Vec<Program>> {
        self.programs.list_pending_for_user(user_id).await
    }

    pub async fn list_for_group(&self, group_id: Uuid, viewer_id: Uuid) -> DomainResult<Vec<Program>> {
        self.ensure_group_member(group_id, viewer_id).await?;
        self.programs.list_for_group(group_id).await
    }

    /// Applies a patch as the owner or an accepted member.
    ///
    /// Entry lists are replaced whole against the latest stored program. Every
    /// effective edit stamps `last_edited_by` and `last_edited_at`.
    pub async fn update(
        &self,
        program_id: Uuid,
        editor_id: Uuid,
        patch: UpdateProgramRequest,
    ) -> DomainResult<Applied> {
        // Existence and permission come before anything derived from the patch.
        let current = self.load(program_id).await?;
        ensure_can_edit(&current, editor_id)?;

        patch.validate_all()?;
        self.ensure_catalog_refs(
            patch
                .workouts
                .iter()
                .flatten()
                .filter_map(|w| w.workout.catalog_id()),
            patch
                .geo_activities
                .iter()
                .flatten()
                .filter_map(|g| g.activity.catalog_id()),
        )
        .await?;

        let outcome = self
            .programs
            .modify(program_id, &|program: &mut Program| {
                ensure_can_edit(program, editor_id)?;
                if !program.apply_patch(&patch) {
                    return Ok(false);
                }
                program.ensure_content()?;
                program.stamp_edit(editor_id, now_micros());
                Ok(true)
            })
            .await?;

        if outcome.changed {
            info!(program_id = %program_id, editor_id = %editor_id, "Program updated");
        }
        Ok(Applied {
            program: outcome.program,
            changed: outcome.changed,
        })
    }

    /// Deletes a program with its memberships. Owner only.
    pub async fn delete(&self, program_id: Uuid, requester_id: Uuid) -> DomainResult<()> {
        let program = self.load(program_id).await?;
        if !program.is_owner(requester_id) {
            return Err(DomainError::Forbidden(
                "Only the program owner can delete the program".to_string(),
            ));
        }
        if !self.programs.delete(program_id).await? {
            return Err(DomainError::program_not_found());
        }
        info!(program_id = %program_id, owner_id = %requester_id, "Program deleted");
        Ok(())
    }

    /// Swaps an entry with its neighbour. Out-of-bounds moves are no-ops.
    pub async fn move_entry(
        &self,
        program_id: Uuid,
        editor_id: Uuid,
        request: MoveEntryRequest,
    ) -> DomainResult<Applied> {
        let outcome = self
            .programs
            .modify(program_id, &|program: &mut Program| {
                ensure_can_edit(program, editor_id)?;
                if !program.move_entry(request.list, request.index, request.direction) {
                    return Ok(false);
                }
                program.stamp_edit(editor_id, now_micros());
                Ok(true)
            })
            .await?;

        if outcome.changed {
            info!(
                program_id = %program_id,
                editor_id = %editor_id,
                list = %request.list,
                index = request.index,
                "Program entry moved"
            );
        }
        Ok(Applied {
            program: outcome.program,
            changed: outcome.changed,
        })
    }

    pub async fn accept(&self, program_id: Uuid, user_id: Uuid) -> DomainResult<Applied> {
        self.respond(program_id, user_id, MembershipAction::Accept).await
    }

    pub async fn decline(&self, program_id: Uuid, user_id: Uuid) -> DomainResult<Applied> {
        self.respond(program_id, user_id, MembershipAction::Decline).await
    }

    /// Applies an accept or decline. Repeating the current response is a no-op.
    pub async fn respond(
        &self,
        program_id: Uuid,
        user_id: Uuid,
        action: MembershipAction,
    ) -> DomainResult<Applied> {
        let outcome = self
            .programs
            .modify(program_id, &|program: &mut Program| {
                if program.is_owner(user_id) {
                    return Err(DomainError::Forbidden(
                        "The program owner cannot accept or decline their own program".to_string(),
                    ));
                }
                let now = now_micros();
                let membership = program.membership_mut(user_id).ok_or_else(|| {
                    DomainError::NotAMember("You were not invited to this program".to_string())
                })?;
                if membership.respond(action, now)? == Transition::Unchanged {
                    return Ok(false);
                }
                program.touch(now);
                Ok(true)
            })
            .await?;

        if outcome.changed {
            info!(
                program_id = %program_id,
                user_id = %user_id,
                action = action.as_str(),
                "Program membership response recorded"
            );
        }
        Ok(Applied {
            program: outcome.program,
            changed: outcome.changed,
        })
    }

    /// Starts a new invitation round for a current group member. Owner only.
    pub async fn reinvite(
        &self,
        program_id: Uuid,
        owner_id: Uuid,
        user_id: Uuid,
    ) -> DomainResult<Applied> {
        let program = self.load(program_id).await?;
        if !program.is_owner(owner_id) {
            return Err(DomainError::Forbidden(
                "Only the program owner can re-invite members".to_string(),
            ));
        }
        let group_id = program.group_id.ok_or_else(|| {
            DomainError::Validation("Personal programs have no members to invite".to_string())
        })?;
        if user_id == owner_id {
            return Err(DomainError::Validation(
                "The program owner cannot be invited".to_string(),
            ));
        }
        if !self.roster.members(group_id).await?.contains(&user_id) {
            return Err(DomainError::Validation(
                "User is not a member of the program's group".to_string(),
            ));
        }

        let outcome = self
            .programs
            .modify(program_id, &|program: &mut Program| {
                let now = now_micros();
                let transition = match program.membership_mut(user_id) {
                    Some(membership) => membership.reinvite(now),
                    None => {
                        program.members.push(Membership::pending(program.id, user_id, now));
                        Transition::Changed
                    }
                };
                if transition == Transition::Unchanged {
                    return Ok(false);
                }
                program.touch(now);
                Ok(true)
            })
            .await?;

        if outcome.changed {
            info!(program_id = %program_id, user_id = %user_id, "Program member re-invited");
        }
        Ok(Applied {
            program: outcome.program,
            changed: outcome.changed,
        })
    }

    /// Stores a session log for the owner or a member of the program.
    pub async fn record_session(
        &self,
        program_id: Uuid,
        user_id: Uuid,
        request: RecordSessionRequest,
    ) -> DomainResult<SessionLog> {
        request.validate()?;
        let program = self.load(program_id).await?;
        if !program.is_participant(user_id) {
            return Err(DomainError::NotAMember(
                "Only program members can record sessions".to_string(),
            ));
        }

        let log = request.into_log(program_id, user_id, now_micros());
        self.sessions.record(&log).await?;
        info!(
            program_id = %program_id,
            user_id = %user_id,
            session_id = %log.id,
            percentage = log.progress.overall_percentage,
            "Program session recorded"
        );
        Ok(log)
    }

    pub async fn progress(&self, program_id: Uuid, viewer_id: Uuid) -> DomainResult<GroupProgramProgress> {
        let program = self.get(program_id, viewer_id).await?;
        let sessions = self.sessions.list_for_program(program_id).await?;
        Ok(aggregate_progress(&program, &sessions))
    }

    /// Group chat messages with announced programs resolved.
    pub async fn messages(&self, group_id: Uuid, viewer_id: Uuid) -> DomainResult<Vec<ResolvedMessage>> {
        self.ensure_group_member(group_id, viewer_id).await?;
        let messages = self.chat.fetch_messages(group_id).await?;
        resolve_messages(messages, self.programs.as_ref()).await
    }

    pub async fn workouts(&self, force_refresh: bool) -> DomainResult<Vec<Workout>> {
        Ok(self.catalog.workouts(force_refresh).await?.as_ref().clone())
    }

    pub async fn geo_activities(&self, force_refresh: bool) -> DomainResult<Vec<GeoActivity>> {
        Ok(self.catalog.geo_activities(force_refresh).await?.as_ref().clone())
    }
}

fn catalog_or_empty<T: Clone>(fetched: DomainResult<Arc<Vec<T>>>) -> Vec<T> {
    match fetched {
        Ok(items) => items.as_ref().clone(),
        Err(e) => {
            warn!(error = %e, "Catalog unavailable, announcing without catalog names");
            Vec::new()
        }
    }
}

fn ensure_can_edit(program: &Program, editor_id: Uuid) -> DomainResult<()> {
    if program.can_edit(editor_id) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(
            "Only the owner and accepted members can edit this program".to_string(),
        ))
    }
}
