//! Workout and geo-activity catalog repository.

use async_trait::async_trait;
use domain::models::{GeoActivity, Workout};
use domain::services::CatalogSource;
use domain::DomainResult;
use sqlx::PgPool;

use crate::entities::{GeoActivityEntity, WorkoutEntity};
use crate::error::into_domain;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for CatalogRepository {
    async fn workouts(&self) -> DomainResult<Vec<Workout>> {
        let timer = QueryTimer::new("list_workouts");
        let result = sqlx::query_as::<_, WorkoutEntity>(
            "SELECT id, name, category FROM workouts ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(into_domain)?
            .into_iter()
            .map(Workout::from)
            .collect())
    }

    async fn geo_activities(&self) -> DomainResult<Vec<GeoActivity>> {
        let timer = QueryTimer::new("list_geo_activities");
        let result = sqlx::query_as::<_, GeoActivityEntity>(
            "SELECT id, name, category FROM geo_activities ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(into_domain)?
            .into_iter()
            .map(GeoActivity::from)
            .collect())
    }
}
