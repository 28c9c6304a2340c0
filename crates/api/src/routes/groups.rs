//! Group-scoped program and chat handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{Program, ResolvedMessage};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/groups/:group_id/programs
pub async fn list_group_programs(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<Program>>, ApiError> {
    Ok(Json(
        state.programs.list_for_group(group_id, auth.user_id).await?,
    ))
}

/// Chat history with announcements resolved to their programs.
///
/// GET /api/v1/groups/:group_id/messages
///
/// An announcement whose program is gone comes back with `program: null`
/// and renders as plain text.
pub async fn list_group_messages(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<ResolvedMessage>>, ApiError> {
    Ok(Json(state.programs.messages(group_id, auth.user_id).await?))
}
