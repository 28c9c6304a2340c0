//! Workout and geo activity catalog handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::{GeoActivity, Workout};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub force_refresh: bool,
}

/// GET /api/v1/catalog/workouts?force_refresh=true
pub async fn list_workouts(
    State(state): State<AppState>,
    _auth: UserAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Workout>>, ApiError> {
    Ok(Json(state.programs.workouts(query.force_refresh).await?))
}

/// GET /api/v1/catalog/geo-activities?force_refresh=true
pub async fn list_geo_activities(
    State(state): State<AppState>,
    _auth: UserAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<GeoActivity>>, ApiError> {
    Ok(Json(
        state.programs.geo_activities(query.force_refresh).await?,
    ))
}
