//! Domain models for group programs.

pub mod catalog;
pub mod membership;
pub mod message;
pub mod program;
pub mod progress;
pub mod session;

pub use catalog::{GeoActivity, Workout};
pub use membership::{Membership, MembershipAction, MembershipCounts, MembershipStatus, Transition};
pub use message::{Announcement, ChatMessage, MessagePayload, OutgoingMessage, ResolvedMessage};
pub use program::{
    CreateProgramRequest, EntryList, EntryRef, GeoActivityEntry, GeoPreferences, MoveDirection,
    MoveEntryRequest, Program, ReinviteRequest, UpdateProgramRequest, WorkoutEntry, WorkoutSet,
};
pub use progress::{GroupProgramProgress, GroupStats, MemberProgress, MemberStats};
pub use session::{RecordSessionRequest, SessionLog, SessionProgress, SessionStatus};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to the microsecond precision the database stores.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
