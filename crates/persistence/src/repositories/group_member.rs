//! Group roster repository.

use async_trait::async_trait;
use domain::services::GroupRoster;
use domain::DomainResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::into_domain;
use crate::metrics::QueryTimer;

/// Reads the group roster maintained by the group membership service.
#[derive(Clone)]
pub struct GroupMemberRepository {
    pool: PgPool,
}

impl GroupMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRoster for GroupMemberRepository {
    async fn members(&self, group_id: Uuid) -> DomainResult<Vec<Uuid>> {
        let timer = QueryTimer::new("list_group_members");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id FROM group_members
            WHERE group_id = $1
            ORDER BY joined_at, user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(into_domain)
    }
}
