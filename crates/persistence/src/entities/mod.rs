//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod catalog;
pub mod message;
pub mod program;
pub mod session;

pub use catalog::{GeoActivityEntity, WorkoutEntity};
pub use message::ChatMessageEntity;
pub use program::{MembershipStatusDb, ProgramEntity, ProgramMembershipEntity};
pub use session::{SessionLogEntity, SessionStatusDb};
