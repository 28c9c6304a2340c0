//! Program and membership entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{GeoActivityEntry, Membership, MembershipStatus, Program, WorkoutEntry};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for membership_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
pub enum MembershipStatusDb {
    Pending,
    Accepted,
    Declined,
}

impl From<MembershipStatusDb> for MembershipStatus {
    fn from(db_status: MembershipStatusDb) -> Self {
        match db_status {
            MembershipStatusDb::Pending => MembershipStatus::Pending,
            MembershipStatusDb::Accepted => MembershipStatus::Accepted,
            MembershipStatusDb::Declined => MembershipStatus::Declined,
        }
    }
}

impl From<MembershipStatus> for MembershipStatusDb {
    fn from(status: MembershipStatus) -> Self {
        match status {
            MembershipStatus::Pending => MembershipStatusDb::Pending,
            MembershipStatus::Accepted => MembershipStatusDb::Accepted,
            MembershipStatus::Declined => MembershipStatusDb::Declined,
        }
    }
}

/// Database row mapping for the programs table.
#[derive(Debug, Clone, FromRow)]
pub struct ProgramEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub group_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub workouts: Json<Vec<WorkoutEntry>>,
    pub geo_activities: Json<Vec<GeoActivityEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_edited_by: Option<Uuid>,
    pub last_edited_at: Option<DateTime<Utc>>,
}

impl ProgramEntity {
    /// Assembles the domain program from its row and membership rows.
    pub fn into_program(self, members: Vec<ProgramMembershipEntity>) -> Program {
        Program {
            id: self.id,
            owner_id: self.owner_id,
            group_id: self.group_id,
            name: self.name,
            description: self.description,
            workouts: self.workouts.0,
            geo_activities: self.geo_activities.0,
            members: members.into_iter().map(Membership::from).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_edited_by: self.last_edited_by,
            last_edited_at: self.last_edited_at,
        }
    }
}

/// Database row mapping for the program_memberships table.
#[derive(Debug, Clone, FromRow)]
pub struct ProgramMembershipEntity {
    pub program_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatusDb,
    pub responded_at: Option<DateTime<Utc>>,
    pub invited_at: DateTime<Utc>,
}

impl From<ProgramMembershipEntity> for Membership {
    fn from(entity: ProgramMembershipEntity) -> Self {
        Self {
            program_id: entity.program_id,
            user_id: entity.user_id,
            status: entity.status.into(),
            responded_at: entity.responded_at,
            invited_at: entity.invited_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{EntryRef, GeoPreferences};
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    #[test]
    fn test_status_round_trip() {
        for status in [
            MembershipStatus::Pending,
            MembershipStatus::Accepted,
            MembershipStatus::Declined,
        ] {
            let db: MembershipStatusDb = status.into();
            assert_eq!(MembershipStatus::from(db), status);
        }
    }

    #[test]
    fn test_into_program_keeps_order_and_members() {
        let id = Uuid::new_v4();
        let member = Uuid::new_v4();
        let now = Utc::now();
        let description: String = Sentence(3..6).fake();
        let workouts = vec![
            WorkoutEntry {
                workout: EntryRef::Custom {
                    name: "B".to_string(),
                    category: None,
                },
                sets: vec![],
                notes: None,
            },
            WorkoutEntry {
                workout: EntryRef::Catalog { id: Uuid::new_v4() },
                sets: vec![],
                notes: Some("warm up".to_string()),
            },
        ];
        let entity = ProgramEntity {
            id,
            owner_id: Uuid::new_v4(),
            group_id: Some(Uuid::new_v4()),
            name: "Evening".to_string(),
            description: description.clone(),
            workouts: Json(workouts.clone()),
            geo_activities: Json(vec![GeoActivityEntry {
                activity: EntryRef::Custom {
                    name: "Walk".to_string(),
                    category: None,
                },
                preferences: GeoPreferences::default(),
            }]),
            created_at: now,
            updated_at: now,
            last_edited_by: None,
            last_edited_at: None,
        };
        let members = vec![ProgramMembershipEntity {
            program_id: id,
            user_id: member,
            status: MembershipStatusDb::Accepted,
            responded_at: Some(now),
            invited_at: now,
        }];

        let program = entity.into_program(members);
        assert_eq!(program.workouts, workouts);
        assert_eq!(program.description, description);
        assert_eq!(program.geo_activities.len(), 1);
        assert_eq!(program.status_of(member), Some(MembershipStatus::Accepted));
    }
}
