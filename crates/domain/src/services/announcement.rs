//! Chat announcements that carry a resolvable program reference.

use std::collections::HashMap;
use uuid::Uuid;

use super::store::ProgramStore;
use crate::error::DomainResult;
use crate::models::{
    Announcement, ChatMessage, EntryRef, GeoActivity, Program, ResolvedMessage, Workout,
};

/// Builds the announcement posted when a group program is created.
///
/// Catalog entries are named from the given catalogs; custom entries use their own name.
pub fn build_announcement(
    program: &Program,
    workouts: &[Workout],
    geo_activities: &[GeoActivity],
) -> Announcement {
    let workout_names: Vec<String> = program
        .workouts
        .iter()
        .map(|entry| {
            entry_name(&entry.workout, "Workout", |id| {
                workouts.iter().find(|w| w.id == id).map(|w| w.name.clone())
            })
        })
        .collect();
    let activity_names: Vec<String> = program
        .geo_activities
        .iter()
        .map(|entry| {
            entry_name(&entry.activity, "Activity", |id| {
                geo_activities
                    .iter()
                    .find(|g| g.id == id)
                    .map(|g| g.name.clone())
            })
        })
        .collect();

    let mut text = format!(
        "📋 New Group Program Created!\n\n\"{}\"\n{}",
        program.name, program.description
    );
    if !workout_names.is_empty() || !activity_names.is_empty() {
        text.push('\n');
    }
    if !workout_names.is_empty() {
        text.push_str(&format!("\n💪 Workouts: {}", workout_names.join(", ")));
    }
    if !activity_names.is_empty() {
        text.push_str(&format!("\n🗺️ Activities: {}", activity_names.join(", ")));
    }

    Announcement {
        program_ref: program.id,
        display_text: text,
    }
}

fn entry_name(entry: &EntryRef, fallback: &str, lookup: impl Fn(Uuid) -> Option<String>) -> String {
    match entry {
        EntryRef::Catalog { id } => lookup(*id).unwrap_or_else(|| fallback.to_string()),
        EntryRef::Custom { name, .. } => name.clone(),
    }
}

/// Pairs each message with the program it announces, in one store lookup.
///
/// The program is `None` for plain messages, deleted programs, and programs
/// that belong to a different group than the message.
pub async fn resolve_messages(
    messages: Vec<ChatMessage>,
    store: &dyn ProgramStore,
) -> DomainResult<Vec<ResolvedMessage>> {
    let mut ids: Vec<Uuid> = messages
        .iter()
        .filter_map(|m| m.payload.program_ref())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let programs: HashMap<Uuid, Program> = store
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(messages
        .into_iter()
        .map(|message| {
            let program = message
                .payload
                .program_ref()
                .and_then(|id| programs.get(&id))
                .filter(|p| p.group_id == Some(message.group_id))
                .cloned();
            ResolvedMessage { message, program }
        })
        .collect())
}
