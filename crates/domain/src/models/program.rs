//! Program domain model: an ordered bundle of workout and geo-activity entries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{
    validate_non_negative, validate_not_blank, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use super::membership::{Membership, MembershipStatus};
use crate::error::{DomainError, DomainResult};

/// Reference to a catalog entry or an ad-hoc definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryRef {
    Catalog {
        id: Uuid,
    },
    Custom {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
}

impl EntryRef {
    pub fn catalog_id(&self) -> Option<Uuid> {
        match self {
            EntryRef::Catalog { id } => Some(*id),
            EntryRef::Custom { .. } => None,
        }
    }

    fn validate_ref(&self, field: &str) -> DomainResult<()> {
        if let EntryRef::Custom { name, .. } = self {
            if validate_not_blank(name).is_err() {
                return Err(DomainError::Validation(format!(
                    "{}: custom entry name must not be empty",
                    field
                )));
            }
            if name.chars().count() > MAX_NAME_LENGTH {
                return Err(DomainError::Validation(format!(
                    "{}: custom entry name must be at most {} characters",
                    field, MAX_NAME_LENGTH
                )));
            }
        }
        Ok(())
    }
}

/// One set of a workout. All targets are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub time_seconds: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub workout: EntryRef,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Geo-activity targets. Absent values mean an unconstrained session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPreferences {
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub avg_pace: Option<f64>,
    #[serde(default)]
    pub countdown_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoActivityEntry {
    pub activity: EntryRef,
    #[serde(default)]
    pub preferences: GeoPreferences,
}

/// Which entry list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryList {
    Workouts,
    Geo,
}

impl fmt::Display for EntryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryList::Workouts => write!(f, "workouts"),
            EntryList::Geo => write!(f, "geo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// A shared exercise program.
///
/// The owner is implicitly accepted and never appears in `members`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Program {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub group_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub workouts: Vec<WorkoutEntry>,
    pub geo_activities: Vec<GeoActivityEntry>,
    pub members: Vec<Membership>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_edited_by: Option<Uuid>,
    pub last_edited_at: Option<DateTime<Utc>>,
}

impl Program {
    /// Builds a new program with one pending membership per invitee.
    ///
    /// The owner and duplicate ids are skipped.
    pub fn new(
        owner_id: Uuid,
        group_id: Option<Uuid>,
        request: CreateProgramRequest,
        invitees: &[Uuid],
        now: DateTime<Utc>,
    ) -> Self {
        let id = Uuid::new_v4();
        let mut members: Vec<Membership> = Vec::with_capacity(invitees.len());
        for user_id in invitees {
            if *user_id == owner_id || members.iter().any(|m| m.user_id == *user_id) {
                continue;
            }
            members.push(Membership::pending(id, *user_id, now));
        }

        Self {
            id,
            owner_id,
            group_id,
            name: request.name.trim().to_string(),
            description: request.description.trim().to_string(),
            workouts: request.workouts,
            geo_activities: request.geo_activities,
            members,
            created_at: now,
            updated_at: now,
            last_edited_by: None,
            last_edited_at: None,
        }
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn membership(&self, user_id: Uuid) -> Option<&Membership> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn membership_mut(&mut self, user_id: Uuid) -> Option<&mut Membership> {
        self.members.iter_mut().find(|m| m.user_id == user_id)
    }

    /// Effective status of a user. The owner is always accepted.
    pub fn status_of(&self, user_id: Uuid) -> Option<MembershipStatus> {
        if self.is_owner(user_id) {
            return Some(MembershipStatus::Accepted);
        }
        self.membership(user_id).map(|m| m.status)
    }

    /// Owner or accepted member.
    pub fn can_edit(&self, user_id: Uuid) -> bool {
        self.status_of(user_id) == Some(MembershipStatus::Accepted)
    }

    /// Owner or a member in any status.
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.status_of(user_id).is_some()
    }

    pub fn accepted_member_ids(&self) -> Vec<Uuid> {
        self.members
            .iter()
            .filter(|m| m.status == MembershipStatus::Accepted)
            .map(|m| m.user_id)
            .collect()
    }

    /// Swaps the entry at `index` with its neighbour.
    ///
    /// Returns false without touching the list when the move would leave the bounds.
    pub fn move_entry(&mut self, list: EntryList, index: usize, direction: MoveDirection) -> bool {
        match list {
            EntryList::Workouts => swap_adjacent(&mut self.workouts, index, direction),
            EntryList::Geo => swap_adjacent(&mut self.geo_activities, index, direction),
        }
    }

    /// Applies a patch. Entry lists are replaced whole, never merged.
    ///
    /// Returns true when any field changed.
    pub fn apply_patch(&mut self, patch: &UpdateProgramRequest) -> bool {
        let mut changed = false;
        if let Some(name) = &patch.name {
            let name = name.trim();
            if self.name != name {
                self.name = name.to_string();
                changed = true;
            }
        }
        if let Some(description) = &patch.description {
            let description = description.trim();
            if self.description != description {
                self.description = description.to_string();
                changed = true;
            }
        }
        if let Some(workouts) = &patch.workouts {
            if &self.workouts != workouts {
                self.workouts = workouts.clone();
                changed = true;
            }
        }
        if let Some(geo) = &patch.geo_activities {
            if &self.geo_activities != geo {
                self.geo_activities = geo.clone();
                changed = true;
            }
        }
        changed
    }

    /// Records a content edit. `last_edited_at` never moves backwards.
    pub fn stamp_edit(&mut self, editor_id: Uuid, now: DateTime<Utc>) {
        let at = self.next_timestamp(now);
        self.last_edited_by = Some(editor_id);
        self.last_edited_at = Some(at);
        self.updated_at = at;
    }

    /// Bumps `updated_at` after a membership change.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = self.next_timestamp(now);
    }

    fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let floor = self
            .last_edited_at
            .map_or(self.updated_at, |edited| edited.max(self.updated_at))
            + Duration::microseconds(1);
        now.max(floor)
    }

    /// Checks the invariants that must hold after any edit.
    pub fn ensure_content(&self) -> DomainResult<()> {
        ensure_has_entries(&self.workouts, &self.geo_activities)
    }

    /// Catalog ids referenced by workout entries.
    pub fn workout_catalog_ids(&self) -> Vec<Uuid> {
        self.workouts
            .iter()
            .filter_map(|w| w.workout.catalog_id())
            .collect()
    }

    /// Catalog ids referenced by geo-activity entries.
    pub fn geo_catalog_ids(&self) -> Vec<Uuid> {
        self.geo_activities
            .iter()
            .filter_map(|g| g.activity.catalog_id())
            .collect()
    }
}

fn swap_adjacent<T>(items: &mut [T], index: usize, direction: MoveDirection) -> bool {
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => index.checked_add(1),
    };
    match target {
        Some(target) if index < items.len() && target < items.len() => {
            items.swap(index, target);
            true
        }
        _ => false,
    }
}

fn ensure_has_entries(workouts: &[WorkoutEntry], geo: &[GeoActivityEntry]) -> DomainResult<()> {
    if workouts.is_empty() && geo.is_empty() {
        return Err(DomainError::Validation(
            "Program must contain at least one workout or geo activity".to_string(),
        ));
    }
    Ok(())
}

/// Validates the shape of entry lists.
pub fn validate_entries(workouts: &[WorkoutEntry], geo: &[GeoActivityEntry]) -> DomainResult<()> {
    for (i, entry) in workouts.iter().enumerate() {
        let field = format!("workouts[{}]", i);
        entry.workout.validate_ref(&field)?;
        if let Some(notes) = &entry.notes {
            if notes.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(DomainError::Validation(format!(
                    "{}.notes: must be at most {} characters",
                    field, MAX_DESCRIPTION_LENGTH
                )));
            }
        }
        for (j, set) in entry.sets.iter().enumerate() {
            if let Some(weight) = set.weight_kg {
                if validate_non_negative(weight).is_err() {
                    return Err(DomainError::Validation(format!(
                        "{}.sets[{}].weight_kg: must be a non-negative number",
                        field, j
                    )));
                }
            }
        }
    }
    for (i, entry) in geo.iter().enumerate() {
        let field = format!("geo_activities[{}]", i);
        entry.activity.validate_ref(&field)?;
        let prefs = &entry.preferences;
        for (name, value) in [("distance_km", prefs.distance_km), ("avg_pace", prefs.avg_pace)] {
            if let Some(value) = value {
                if validate_non_negative(value).is_err() {
                    return Err(DomainError::Validation(format!(
                        "{}.preferences.{}: must be a non-negative number",
                        field, name
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Request payload for creating a program.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateProgramRequest {
    #[serde(default)]
    pub group_id: Option<Uuid>,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(
        length(
            min = 1,
            max = 1000,
            message = "Description must be between 1 and 1000 characters"
        ),
        custom(function = "validate_not_blank")
    )]
    pub description: String,

    #[serde(default)]
    pub workouts: Vec<WorkoutEntry>,

    #[serde(default)]
    pub geo_activities: Vec<GeoActivityEntry>,
}

impl CreateProgramRequest {
    /// Field validation plus entry-list checks.
    pub fn validate_all(&self) -> DomainResult<()> {
        self.validate()?;
        ensure_has_entries(&self.workouts, &self.geo_activities)?;
        validate_entries(&self.workouts, &self.geo_activities)
    }
}

/// Partial update. Provided entry lists replace the stored lists whole.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProgramRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(
        min = 1,
        max = 1000,
        message = "Description must be between 1 and 1000 characters"
    ))]
    pub description: Option<String>,

    pub workouts: Option<Vec<WorkoutEntry>>,

    pub geo_activities: Option<Vec<GeoActivityEntry>>,
}

impl UpdateProgramRequest {
    pub fn validate_all(&self) -> DomainResult<()> {
        self.validate()?;
        for (field, value) in [("name", &self.name), ("description", &self.description)] {
            if let Some(value) = value {
                if validate_not_blank(value).is_err() {
                    return Err(DomainError::Validation(format!(
                        "{}: Value must not be empty",
                        field
                    )));
                }
            }
        }
        validate_entries(
            self.workouts.as_deref().unwrap_or_default(),
            self.geo_activities.as_deref().unwrap_or_default(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.workouts.is_none()
            && self.geo_activities.is_none()
    }
}

/// Request payload for an adjacent-swap move.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct MoveEntryRequest {
    pub list: EntryList,
    pub index: usize,
    pub direction: MoveDirection,
}

/// Request payload for re-inviting a member.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ReinviteRequest {
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::membership::MembershipAction;

    fn custom_workout(name: &str) -> WorkoutEntry {
        WorkoutEntry {
            workout: EntryRef::Custom {
                name: name.to_string(),
                category: None,
            },
            sets: vec![WorkoutSet {
                reps: Some(10),
                time_seconds: None,
                weight_kg: Some(20.0),
            }],
            notes: None,
        }
    }

    fn request(workouts: Vec<WorkoutEntry>) -> CreateProgramRequest {
        CreateProgramRequest {
            group_id: None,
            name: "Leg day".to_string(),
            description: "Squats and lunges".to_string(),
            workouts,
            geo_activities: vec![],
        }
    }

    fn program(workouts: Vec<WorkoutEntry>, invitees: &[Uuid]) -> Program {
        Program::new(Uuid::new_v4(), None, request(workouts), invitees, Utc::now())
    }

    fn names(p: &Program) -> Vec<String> {
        p.workouts
            .iter()
            .map(|w| match &w.workout {
                EntryRef::Custom { name, .. } => name.clone(),
                EntryRef::Catalog { id } => id.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_new_skips_owner_and_duplicates() {
        let owner = Uuid::new_v4();
        let a = Uuid::new_v4();
        let p = Program::new(
            owner,
            Some(Uuid::new_v4()),
            request(vec![custom_workout("Squat")]),
            &[owner, a, a],
            Utc::now(),
        );
        assert_eq!(p.members.len(), 1);
        assert_eq!(p.members[0].user_id, a);
        assert_eq!(p.members[0].status, MembershipStatus::Pending);
        assert_eq!(p.members[0].program_id, p.id);
        assert!(p.last_edited_by.is_none());
    }

    #[test]
    fn test_owner_is_implicitly_accepted() {
        let p = program(vec![custom_workout("Squat")], &[]);
        assert_eq!(p.status_of(p.owner_id), Some(MembershipStatus::Accepted));
        assert!(p.can_edit(p.owner_id));
        assert!(p.membership(p.owner_id).is_none());
    }

    #[test]
    fn test_can_edit_requires_accepted() {
        let a = Uuid::new_v4();
        let mut p = program(vec![custom_workout("Squat")], &[a]);
        assert!(!p.can_edit(a));
        assert!(p.is_participant(a));
        p.membership_mut(a)
            .unwrap()
            .respond(MembershipAction::Accept, Utc::now())
            .unwrap();
        assert!(p.can_edit(a));
        assert!(!p.can_edit(Uuid::new_v4()));
    }

    #[test]
    fn test_move_entry_out_of_bounds_is_noop() {
        let mut p = program(vec![custom_workout("A"), custom_workout("B")], &[]);
        let before = p.workouts.clone();
        assert!(!p.move_entry(EntryList::Workouts, 0, MoveDirection::Up));
        assert!(!p.move_entry(EntryList::Workouts, 1, MoveDirection::Down));
        assert!(!p.move_entry(EntryList::Workouts, 7, MoveDirection::Up));
        assert!(!p.move_entry(EntryList::Geo, 0, MoveDirection::Down));
        assert_eq!(p.workouts, before);
    }

    #[test]
    fn test_move_entry_swaps_adjacent() {
        let mut p = program(
            vec![custom_workout("A"), custom_workout("B"), custom_workout("C")],
            &[],
        );
        assert!(p.move_entry(EntryList::Workouts, 1, MoveDirection::Up));
        assert_eq!(names(&p), vec!["B", "A", "C"]);
        assert!(p.move_entry(EntryList::Workouts, 1, MoveDirection::Down));
        assert_eq!(names(&p), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_stamp_edit_is_monotonic() {
        let mut p = program(vec![custom_workout("A")], &[]);
        let editor = Uuid::new_v4();
        let now = Utc::now();
        p.stamp_edit(editor, now);
        let first = p.last_edited_at.unwrap();

        // A clock that steps backwards still advances the stamp.
        p.stamp_edit(editor, now - Duration::seconds(10));
        let second = p.last_edited_at.unwrap();
        assert!(second > first);
        assert_eq!(p.last_edited_by, Some(editor));
        assert_eq!(p.updated_at, second);
    }

    #[test]
    fn test_apply_patch_replaces_lists() {
        let mut p = program(vec![custom_workout("A"), custom_workout("B")], &[]);
        let patch = UpdateProgramRequest {
            workouts: Some(vec![custom_workout("C")]),
            ..Default::default()
        };
        assert!(p.apply_patch(&patch));
        assert_eq!(names(&p), vec!["C"]);
        assert!(!p.apply_patch(&patch));
    }

    #[test]
    fn test_create_request_requires_name_and_description() {
        let mut req = request(vec![custom_workout("A")]);
        req.name = "   ".to_string();
        assert!(matches!(req.validate_all(), Err(DomainError::Validation(_))));

        let mut req = request(vec![custom_workout("A")]);
        req.description = String::new();
        assert!(matches!(req.validate_all(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_create_request_requires_entries() {
        let req = request(vec![]);
        let err = req.validate_all().unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_entries_reject_negative_measurements() {
        let mut entry = custom_workout("A");
        entry.sets[0].weight_kg = Some(-1.0);
        assert!(request(vec![entry]).validate_all().is_err());

        let geo = GeoActivityEntry {
            activity: EntryRef::Custom {
                name: "Run".to_string(),
                category: None,
            },
            preferences: GeoPreferences {
                distance_km: Some(-3.0),
                ..Default::default()
            },
        };
        assert!(validate_entries(&[], &[geo]).is_err());
    }

    #[test]
    fn test_update_request_rejects_blank_name() {
        let patch = UpdateProgramRequest {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(patch.validate_all().is_err());
        assert!(!patch.is_empty());
        assert!(UpdateProgramRequest::default().is_empty());
    }

    #[test]
    fn test_entry_ref_serde_tagging() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(EntryRef::Catalog { id }).unwrap();
        assert_eq!(json["kind"], "catalog");
        assert_eq!(json["id"], id.to_string());

        let custom: EntryRef =
            serde_json::from_str(r#"{"kind":"custom","name":"Burpees"}"#).unwrap();
        assert_eq!(
            custom,
            EntryRef::Custom {
                name: "Burpees".to_string(),
                category: None
            }
        );
    }

    #[test]
    fn test_geo_preferences_default_when_missing() {
        let entry: GeoActivityEntry =
            serde_json::from_str(r#"{"activity":{"kind":"custom","name":"Walk"}}"#).unwrap();
        assert_eq!(entry.preferences, GeoPreferences::default());
    }
}
