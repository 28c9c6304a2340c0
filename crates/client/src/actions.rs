//! Accept and decline with optimistic display and single-flight per program.

use domain::models::{MembershipAction, MembershipStatus, Program};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ClientResult;
use crate::gate::ActionGate;
use crate::http::ProgramsClient;
use crate::overlay::MembershipOverlay;

#[derive(Debug, Clone)]
pub struct MembershipActions {
    client: ProgramsClient,
    gate: ActionGate,
    overlay: Arc<Mutex<MembershipOverlay>>,
}

impl MembershipActions {
    pub fn new(client: ProgramsClient, user_id: Uuid) -> Self {
        Self {
            client,
            gate: ActionGate::new(),
            overlay: Arc::new(Mutex::new(MembershipOverlay::new(user_id))),
        }
    }

    pub async fn accept(&self, program_id: Uuid) -> ClientResult<Program> {
        self.respond(program_id, MembershipAction::Accept).await
    }

    pub async fn decline(&self, program_id: Uuid) -> ClientResult<Program> {
        self.respond(program_id, MembershipAction::Decline).await
    }

    /// Sends a response, showing its status until the server answers.
    ///
    /// Fails with `Busy` while another response for the program is in flight.
    /// On failure the optimistic status is rolled back.
    pub async fn respond(
        &self,
        program_id: Uuid,
        action: MembershipAction,
    ) -> ClientResult<Program> {
        let _permit = self.gate.try_acquire(program_id)?;
        self.overlay().set(program_id, action.target());

        let result = match action {
            MembershipAction::Accept => self.client.accept_program(program_id).await,
            MembershipAction::Decline => self.client.decline_program(program_id).await,
        };

        match &result {
            Ok(program) => {
                let agreed = self.overlay().settle(program);
                info!(
                    program_id = %program_id,
                    action = action.as_str(),
                    agreed,
                    "Membership response sent"
                );
            }
            Err(e) => {
                warn!(
                    program_id = %program_id,
                    action = action.as_str(),
                    error = %e,
                    "Membership response failed"
                );
                self.overlay().rollback(program_id);
            }
        }
        result
    }

    /// Status shown for a program while a response is unconfirmed.
    pub fn pending_status(&self, program_id: Uuid) -> Option<MembershipStatus> {
        self.overlay().status(program_id)
    }

    /// Applies optimistic statuses to a polled snapshot.
    pub fn overlay_snapshot(&self, programs: &mut [Program]) {
        self.overlay().apply(programs);
    }

    fn overlay(&self) -> MutexGuard<'_, MembershipOverlay> {
        self.overlay.lock().unwrap_or_else(|e| e.into_inner())
    }
}
