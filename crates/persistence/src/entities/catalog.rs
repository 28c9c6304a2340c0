//! Catalog entities (database row mappings).

use domain::models::{GeoActivity, Workout};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct WorkoutEntity {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
}

impl From<WorkoutEntity> for Workout {
    fn from(entity: WorkoutEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            category: entity.category,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GeoActivityEntity {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
}

impl From<GeoActivityEntity> for GeoActivity {
    fn from(entity: GeoActivityEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            category: entity.category,
        }
    }
}
