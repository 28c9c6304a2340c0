//! Session log entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{SessionLog, SessionProgress, SessionStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for session_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
pub enum SessionStatusDb {
    NotStarted,
    InProgress,
    Completed,
    Partial,
}

impl From<SessionStatusDb> for SessionStatus {
    fn from(db_status: SessionStatusDb) -> Self {
        match db_status {
            SessionStatusDb::NotStarted => SessionStatus::NotStarted,
            SessionStatusDb::InProgress => SessionStatus::InProgress,
            SessionStatusDb::Completed => SessionStatus::Completed,
            SessionStatusDb::Partial => SessionStatus::Partial,
        }
    }
}

impl From<SessionStatus> for SessionStatusDb {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::NotStarted => SessionStatusDb::NotStarted,
            SessionStatus::InProgress => SessionStatusDb::InProgress,
            SessionStatus::Completed => SessionStatusDb::Completed,
            SessionStatus::Partial => SessionStatusDb::Partial,
        }
    }
}

/// Database row mapping for the program_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct SessionLogEntity {
    pub id: Uuid,
    pub program_id: Uuid,
    pub user_id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub total_calories_burned: f64,
    pub total_duration_minutes: f64,
    pub total_distance_km: Option<f64>,
    pub overall_percentage: f64,
    pub status: SessionStatusDb,
}

impl From<SessionLogEntity> for SessionLog {
    fn from(entity: SessionLogEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            program_id: entity.program_id,
            performed_at: entity.performed_at,
            total_calories_burned: entity.total_calories_burned,
            total_duration_minutes: entity.total_duration_minutes,
            total_distance_km: entity.total_distance_km,
            progress: SessionProgress {
                overall_percentage: entity.overall_percentage,
                status: entity.status.into(),
            },
        }
    }
}
