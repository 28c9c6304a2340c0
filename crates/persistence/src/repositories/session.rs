//! Session log repository.

use async_trait::async_trait;
use domain::models::SessionLog;
use domain::services::SessionLogStore;
use domain::DomainResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{SessionLogEntity, SessionStatusDb};
use crate::error::into_domain;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionLogStore for SessionRepository {
    async fn record(&self, log: &SessionLog) -> DomainResult<()> {
        let timer = QueryTimer::new("insert_program_session");
        let result = sqlx::query(
            r#"
            INSERT INTO program_sessions (id, program_id, user_id, performed_at,
                total_calories_burned, total_duration_minutes, total_distance_km,
                overall_percentage, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(log.id)
        .bind(log.program_id)
        .bind(log.user_id)
        .bind(log.performed_at)
        .bind(log.total_calories_burned)
        .bind(log.total_duration_minutes)
        .bind(log.total_distance_km)
        .bind(log.progress.overall_percentage)
        .bind(SessionStatusDb::from(log.progress.status))
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|_| ()).map_err(into_domain)
    }

    async fn list_for_program(&self, program_id: Uuid) -> DomainResult<Vec<SessionLog>> {
        let timer = QueryTimer::new("list_program_sessions");
        let result = sqlx::query_as::<_, SessionLogEntity>(
            r#"
            SELECT id, program_id, user_id, performed_at, total_calories_burned,
                total_duration_minutes, total_distance_km, overall_percentage, status
            FROM program_sessions
            WHERE program_id = $1
            ORDER BY performed_at DESC
            "#,
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(into_domain)?
            .into_iter()
            .map(SessionLog::from)
            .collect())
    }
}
