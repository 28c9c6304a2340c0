//! Program endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CreateProgramRequest, GroupProgramProgress, MembershipAction, MoveEntryRequest, Program,
    RecordSessionRequest, ReinviteRequest, SessionLog, UpdateProgramRequest,
};
use tracing::debug;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{
    record_membership_response, record_program_created, record_session_logged,
};

/// Create a program, inviting the rest of the group.
///
/// POST /api/v1/programs
///
/// Returns 201 with the stored program.
/// Returns 403 if the caller is not in the target group.
pub async fn create_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateProgramRequest>,
) -> Result<(StatusCode, Json<Program>), ApiError> {
    let program = state.programs.create(auth.user_id, request).await?;
    record_program_created(program.group_id.is_some());
    Ok((StatusCode::CREATED, Json(program)))
}

/// GET /api/v1/programs
pub async fn list_user_programs(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Vec<Program>>, ApiError> {
    Ok(Json(state.programs.list_for_user(auth.user_id).await?))
}

/// Programs awaiting the caller's response.
///
/// GET /api/v1/programs/pending
pub async fn list_pending_programs(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Vec<Program>>, ApiError> {
    Ok(Json(state.programs.list_pending(auth.user_id).await?))
}

/// GET /api/v1/programs/:program_id
pub async fn get_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
) -> Result<Json<Program>, ApiError> {
    Ok(Json(state.programs.get(program_id, auth.user_id).await?))
}

/// Edit name, description or replace entry lists.
///
/// PUT /api/v1/programs/:program_id
///
/// Returns 403 unless the caller is the owner or an accepted member.
pub async fn update_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
    Json(patch): Json<UpdateProgramRequest>,
) -> Result<Json<Program>, ApiError> {
    let applied = state.programs.update(program_id, auth.user_id, patch).await?;
    Ok(Json(applied.program))
}

/// DELETE /api/v1/programs/:program_id
///
/// Owner only. Returns 204.
pub async fn delete_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.programs.delete(program_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Swap an entry with its neighbour.
///
/// POST /api/v1/programs/:program_id/move
///
/// Moves past either end leave the program untouched and return it as is.
pub async fn move_entry(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
    Json(request): Json<MoveEntryRequest>,
) -> Result<Json<Program>, ApiError> {
    let applied = state
        .programs
        .move_entry(program_id, auth.user_id, request)
        .await?;
    if !applied.changed {
        debug!(program_id = %program_id, "Move out of bounds, program unchanged");
    }
    Ok(Json(applied.program))
}

/// PUT /api/v1/programs/:program_id/accept
///
/// Accepting twice returns 200 with the unchanged program.
pub async fn accept_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
) -> Result<Json<Program>, ApiError> {
    respond(state, auth, program_id, MembershipAction::Accept).await
}

/// PUT /api/v1/programs/:program_id/decline
pub async fn decline_program(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
) -> Result<Json<Program>, ApiError> {
    respond(state, auth, program_id, MembershipAction::Decline).await
}

async fn respond(
    state: AppState,
    auth: UserAuth,
    program_id: Uuid,
    action: MembershipAction,
) -> Result<Json<Program>, ApiError> {
    let applied = state
        .programs
        .respond(program_id, auth.user_id, action)
        .await?;
    record_membership_response(action.as_str(), applied.changed);
    Ok(Json(applied.program))
}

/// Put a group member back to pending.
///
/// POST /api/v1/programs/:program_id/reinvite
///
/// Owner only.
pub async fn reinvite_member(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
    Json(request): Json<ReinviteRequest>,
) -> Result<Json<Program>, ApiError> {
    let applied = state
        .programs
        .reinvite(program_id, auth.user_id, request.user_id)
        .await?;
    Ok(Json(applied.program))
}

/// GET /api/v1/programs/:program_id/progress
pub async fn get_progress(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
) -> Result<Json<GroupProgramProgress>, ApiError> {
    Ok(Json(state.programs.progress(program_id, auth.user_id).await?))
}

/// Store a session performed by the caller.
///
/// POST /api/v1/programs/:program_id/sessions
///
/// Returns 201. Returns 403 `not_a_member` if the caller is not part of the program.
pub async fn record_session(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(program_id): Path<Uuid>,
    Json(request): Json<RecordSessionRequest>,
) -> Result<(StatusCode, Json<SessionLog>), ApiError> {
    let log = state
        .programs
        .record_session(program_id, auth.user_id, request)
        .await?;
    record_session_logged();
    Ok((StatusCode::CREATED, Json(log)))
}
