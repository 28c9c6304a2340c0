//! Group progress summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::membership::MembershipStatus;
use super::session::{SessionLog, SessionStatus};

/// Per-member totals over the member's sessions for one program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    pub total_sessions: usize,
    pub total_calories: f64,
    pub total_duration: f64,
    pub total_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProgress {
    pub user_id: Uuid,
    pub status: MembershipStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub stats: MemberStats,
    /// Status of the latest session, `not_started` when there is none.
    pub session_status: SessionStatus,
    pub latest_session: Option<SessionLog>,
    /// Newest first.
    pub sessions: Vec<SessionLog>,
}

/// Group-level summary. All counts exclude the owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub total_members: usize,
    pub accepted_members: usize,
    pub pending_members: usize,
    pub declined_members: usize,
    pub total_group_sessions: usize,
    pub total_group_calories: f64,
    pub total_group_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProgramProgress {
    pub program_id: Uuid,
    pub group_stats: GroupStats,
    pub member_progress: Vec<MemberProgress>,
}
