//! Program membership and its invitation lifecycle.
//!
//! A membership row exists for every non-owner group member invited to a
//! program. Rows start `pending` and move to `accepted` or `declined` once per
//! invitation round. The owner is implicitly accepted and never has a row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Invitation status of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Accepted,
    Declined,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Accepted => "accepted",
            MembershipStatus::Declined => "declined",
        }
    }

    /// Returns true once the member has responded in this invitation round.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MembershipStatus::Pending)
    }
}

impl FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MembershipStatus::Pending),
            "accepted" => Ok(MembershipStatus::Accepted),
            "declined" => Ok(MembershipStatus::Declined),
            _ => Err(format!("Invalid membership status: {}", s)),
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A member's response to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipAction {
    Accept,
    Decline,
}

impl MembershipAction {
    pub fn target(&self) -> MembershipStatus {
        match self {
            MembershipAction::Accept => MembershipStatus::Accepted,
            MembershipAction::Decline => MembershipStatus::Declined,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipAction::Accept => "accept",
            MembershipAction::Decline => "decline",
        }
    }
}

/// Whether applying a transition changed the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    Unchanged,
}

/// A non-owner member's invitation record for one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Membership {
    pub program_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub invited_at: DateTime<Utc>,
}

impl Membership {
    /// Creates a fresh pending invitation.
    pub fn pending(program_id: Uuid, user_id: Uuid, invited_at: DateTime<Utc>) -> Self {
        Self {
            program_id,
            user_id,
            status: MembershipStatus::Pending,
            responded_at: None,
            invited_at,
        }
    }

    /// Applies an accept/decline response.
    ///
    /// Repeating the same response is a no-op. Switching between accepted and
    /// declined within one invitation round is rejected; the owner has to
    /// re-invite the member first.
    pub fn respond(&mut self, action: MembershipAction, at: DateTime<Utc>) -> DomainResult<Transition> {
        let target = action.target();
        if self.status == target {
            return Ok(Transition::Unchanged);
        }
        if self.status.is_terminal() {
            return Err(DomainError::Forbidden(format!(
                "Invitation was already {}; ask the program owner to re-invite you",
                self.status
            )));
        }

        self.status = target;
        if self.responded_at.is_none() {
            self.responded_at = Some(at);
        }
        Ok(Transition::Changed)
    }

    /// Starts a new invitation round.
    pub fn reinvite(&mut self, at: DateTime<Utc>) -> Transition {
        if self.status == MembershipStatus::Pending {
            return Transition::Unchanged;
        }
        self.status = MembershipStatus::Pending;
        self.responded_at = None;
        self.invited_at = at;
        Transition::Changed
    }
}

/// Membership tallies. The owner is never counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipCounts {
    pub total: usize,
    pub accepted: usize,
    pub pending: usize,
    pub declined: usize,
}

impl MembershipCounts {
    pub fn tally(members: &[Membership]) -> Self {
        members.iter().fold(Self::default(), |mut counts, m| {
            counts.total += 1;
            match m.status {
                MembershipStatus::Accepted => counts.accepted += 1,
                MembershipStatus::Pending => counts.pending += 1,
                MembershipStatus::Declined => counts.declined += 1,
            }
            counts
        })
    }
}
