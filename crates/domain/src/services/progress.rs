//! Rolls session logs up into per-member and group statistics.

use crate::models::{
    GroupProgramProgress, GroupStats, MemberProgress, MemberStats, MembershipCounts,
    MembershipStatus, Program, SessionLog, SessionStatus,
};

/// Aggregates progress for a program.
///
/// Only accepted members contribute; sessions of pending or declined members,
/// of the owner, or of other programs are ignored. Never fails: a program
/// without accepted members yields zero sums and an empty member list.
pub fn aggregate_progress(program: &Program, sessions: &[SessionLog]) -> GroupProgramProgress {
    let counts = MembershipCounts::tally(&program.members);

    let member_progress: Vec<MemberProgress> = program
        .members
        .iter()
        .filter(|m| m.status == MembershipStatus::Accepted)
        .map(|member| {
            let mut own: Vec<SessionLog> = sessions
                .iter()
                .filter(|s| s.program_id == program.id && s.user_id == member.user_id)
                .cloned()
                .collect();
            own.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));

            let stats = own.iter().fold(MemberStats::default(), |mut stats, s| {
                stats.total_sessions += 1;
                stats.total_calories += s.total_calories_burned;
                stats.total_duration += s.total_duration_minutes;
                stats.total_distance += s.total_distance_km.unwrap_or(0.0);
                stats
            });
            let latest_session = own.first().cloned();

            MemberProgress {
                user_id: member.user_id,
                status: member.status,
                responded_at: member.responded_at,
                stats,
                session_status: latest_session
                    .as_ref()
                    .map_or(SessionStatus::NotStarted, |s| s.progress.status),
                latest_session,
                sessions: own,
            }
        })
        .collect();

    let group_stats = member_progress.iter().fold(
        GroupStats {
            total_members: counts.total,
            accepted_members: counts.accepted,
            pending_members: counts.pending,
            declined_members: counts.declined,
            ..GroupStats::default()
        },
        |mut group, member| {
            group.total_group_sessions += member.stats.total_sessions;
            group.total_group_calories += member.stats.total_calories;
            group.total_group_duration += member.stats.total_duration;
            group
        },
    );

    GroupProgramProgress {
        program_id: program.id,
        group_stats,
        member_progress,
    }
}
