//! Exercise session logs authored by program members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::validate_non_negative;
use uuid::Uuid;
use validator::Validate;

/// Completion label of a session.
///
/// `Partial` is accepted from producers that send it but is never derived
/// from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
    Partial,
}

impl SessionStatus {
    /// Canonical classification: 100 is completed, anything above 0 is in progress.
    pub fn classify(overall_percentage: f64) -> Self {
        if overall_percentage >= 100.0 {
            SessionStatus::Completed
        } else if overall_percentage > 0.0 {
            SessionStatus::InProgress
        } else {
            SessionStatus::NotStarted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not_started",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Partial => "partial",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(SessionStatus::NotStarted),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "partial" => Ok(SessionStatus::Partial),
            _ => Err(format!("Invalid session status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub overall_percentage: f64,
    pub status: SessionStatus,
}

impl SessionProgress {
    /// Clamps the percentage to 0..=100 and derives the status.
    ///
    /// A reported `partial` label is kept as-is.
    pub fn normalized(overall_percentage: f64, reported: Option<SessionStatus>) -> Self {
        let overall_percentage = if overall_percentage.is_finite() {
            overall_percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let status = match reported {
            Some(SessionStatus::Partial) => SessionStatus::Partial,
            _ => SessionStatus::classify(overall_percentage),
        };
        Self {
            overall_percentage,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub program_id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub total_calories_burned: f64,
    pub total_duration_minutes: f64,
    pub total_distance_km: Option<f64>,
    pub progress: SessionProgress,
}

/// Request payload for recording a session against a program.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RecordSessionRequest {
    #[serde(default)]
    pub performed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub total_calories_burned: f64,

    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub total_duration_minutes: f64,

    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub total_distance_km: Option<f64>,

    #[serde(default)]
    pub overall_percentage: f64,

    #[serde(default)]
    pub status: Option<SessionStatus>,
}

impl RecordSessionRequest {
    pub fn into_log(self, program_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> SessionLog {
        SessionLog {
            id: Uuid::new_v4(),
            user_id,
            program_id,
            performed_at: self.performed_at.unwrap_or(now),
            total_calories_burned: self.total_calories_burned,
            total_duration_minutes: self.total_duration_minutes,
            total_distance_km: self.total_distance_km,
            progress: SessionProgress::normalized(self.overall_percentage, self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(SessionStatus::classify(100.0), SessionStatus::Completed);
        assert_eq!(SessionStatus::classify(50.0), SessionStatus::InProgress);
        assert_eq!(SessionStatus::classify(0.5), SessionStatus::InProgress);
        assert_eq!(SessionStatus::classify(0.0), SessionStatus::NotStarted);
    }

    #[test]
    fn test_normalized_clamps() {
        let p = SessionProgress::normalized(140.0, None);
        assert_eq!(p.overall_percentage, 100.0);
        assert_eq!(p.status, SessionStatus::Completed);

        let p = SessionProgress::normalized(-5.0, Some(SessionStatus::Completed));
        assert_eq!(p.overall_percentage, 0.0);
        assert_eq!(p.status, SessionStatus::NotStarted);

        let p = SessionProgress::normalized(f64::NAN, None);
        assert_eq!(p.overall_percentage, 0.0);
    }

    #[test]
    fn test_partial_label_is_preserved() {
        let p = SessionProgress::normalized(40.0, Some(SessionStatus::Partial));
        assert_eq!(p.status, SessionStatus::Partial);
    }

    #[test]
    fn test_status_serde_and_parse() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            "not_started".parse::<SessionStatus>().unwrap(),
            SessionStatus::NotStarted
        );
        assert!("done".parse::<SessionStatus>().is_err());
        assert_eq!(SessionStatus::Partial.as_str(), "partial");
    }

    #[test]
    fn test_record_request_validation() {
        let req: RecordSessionRequest = serde_json::from_str(
            r#"{"total_calories_burned": -1, "total_duration_minutes": 30, "overall_percentage": 50}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());

        let req: RecordSessionRequest = serde_json::from_str(
            r#"{"total_calories_burned": 200, "total_duration_minutes": 30, "overall_percentage": 50}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        let now = Utc::now();
        let log = req.into_log(Uuid::new_v4(), Uuid::new_v4(), now);
        assert_eq!(log.performed_at, now);
        assert_eq!(log.total_distance_km, None);
        assert_eq!(log.progress.status, SessionStatus::InProgress);
    }
}
