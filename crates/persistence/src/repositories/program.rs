//! Program repository: programs and their memberships.

use async_trait::async_trait;
use domain::models::{Membership, Program};
use domain::services::{EditOutcome, ProgramEdit, ProgramStore};
use domain::{DomainError, DomainResult};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{MembershipStatusDb, ProgramEntity, ProgramMembershipEntity};
use crate::error::into_domain;
use crate::metrics::{record_pool_metrics, QueryTimer};

const PROGRAM_COLUMNS: &str = "p.id, p.owner_id, p.group_id, p.name, p.description, \
    p.workouts, p.geo_activities, p.created_at, p.updated_at, p.last_edited_by, p.last_edited_at";

/// Repository for program-related database operations.
#[derive(Clone)]
pub struct ProgramRepository {
    pool: PgPool,
}

impl ProgramRepository {
    /// Creates a new ProgramRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads membership rows for the given programs and assembles the programs.
    async fn with_members(&self, entities: Vec<ProgramEntity>) -> DomainResult<Vec<Program>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = entities.iter().map(|e| e.id).collect();

        let timer = QueryTimer::new("find_program_memberships");
        let result = sqlx::query_as::<_, ProgramMembershipEntity>(
            r#"
            SELECT program_id, user_id, status, responded_at, invited_at
            FROM program_memberships
            WHERE program_id = ANY($1)
            ORDER BY invited_at, user_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);

        let mut by_program: HashMap<Uuid, Vec<ProgramMembershipEntity>> = HashMap::new();
        for row in result.map_err(into_domain)? {
            by_program.entry(row.program_id).or_default().push(row);
        }

        Ok(entities
            .into_iter()
            .map(|entity| {
                let members = by_program.remove(&entity.id).unwrap_or_default();
                entity.into_program(members)
            })
            .collect())
    }

    async fn list_where(
        &self,
        query_name: &'static str,
        condition: &str,
        param: Uuid,
    ) -> DomainResult<Vec<Program>> {
        let sql = format!(
            "SELECT {} FROM programs p WHERE {} ORDER BY p.created_at DESC, p.id DESC",
            PROGRAM_COLUMNS, condition
        );
        let timer = QueryTimer::new(query_name);
        let result = sqlx::query_as::<_, ProgramEntity>(&sql)
            .bind(param)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&result);
        self.with_members(result.map_err(into_domain)?).await
    }

    async fn upsert_membership(
        tx: &mut Transaction<'_, Postgres>,
        membership: &Membership,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO program_memberships (program_id, user_id, status, responded_at, invited_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (program_id, user_id) DO UPDATE
            SET status = EXCLUDED.status,
                responded_at = EXCLUDED.responded_at,
                invited_at = EXCLUDED.invited_at
            "#,
        )
        .bind(membership.program_id)
        .bind(membership.user_id)
        .bind(MembershipStatusDb::from(membership.status))
        .bind(membership.responded_at)
        .bind(membership.invited_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProgramStore for ProgramRepository {
    async fn insert(&self, program: &Program) -> DomainResult<()> {
        let timer = QueryTimer::new("insert_program");
        let result: Result<(), sqlx::Error> = async {
            // Program and memberships are created atomically
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                INSERT INTO programs (id, owner_id, group_id, name, description, workouts,
                    geo_activities, created_at, updated_at, last_edited_by, last_edited_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(program.id)
            .bind(program.owner_id)
            .bind(program.group_id)
            .bind(&program.name)
            .bind(&program.description)
            .bind(Json(&program.workouts))
            .bind(Json(&program.geo_activities))
            .bind(program.created_at)
            .bind(program.updated_at)
            .bind(program.last_edited_by)
            .bind(program.last_edited_at)
            .execute(&mut *tx)
            .await?;

            for membership in &program.members {
                Self::upsert_membership(&mut tx, membership).await?;
            }

            tx.commit().await
        }
        .await;
        timer.finish(&result);
        result.map_err(into_domain)
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Program>> {
        let sql = format!("SELECT {} FROM programs p WHERE p.id = $1", PROGRAM_COLUMNS);
        let timer = QueryTimer::new("find_program_by_id");
        let result = sqlx::query_as::<_, ProgramEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(&result);

        match result.map_err(into_domain)? {
            Some(entity) => Ok(self.with_members(vec![entity]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Program>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM programs p WHERE p.id = ANY($1)", PROGRAM_COLUMNS);
        let timer = QueryTimer::new("find_programs_by_ids");
        let result = sqlx::query_as::<_, ProgramEntity>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await;
        timer.finish(&result);

        self.with_members(result.map_err(into_domain)?).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Program>> {
        self.list_where(
            "list_programs_for_user",
            "p.owner_id = $1 OR EXISTS (SELECT 1 FROM program_memberships m \
             WHERE m.program_id = p.id AND m.user_id = $1)",
            user_id,
        )
        .await
    }

    async fn list_for_group(&self, group_id: Uuid) -> DomainResult<Vec<Program>> {
        self.list_where("list_programs_for_group", "p.group_id = $1", group_id)
            .await
    }

    async fn list_pending_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Program>> {
        self.list_where(
            "list_pending_programs_for_user",
            "EXISTS (SELECT 1 FROM program_memberships m \
             WHERE m.program_id = p.id AND m.user_id = $1 AND m.status = 'pending')",
            user_id,
        )
        .await
    }

    async fn modify(&self, id: Uuid, edit: &ProgramEdit<'_>) -> DomainResult<EditOutcome> {
        let timer = QueryTimer::new("modify_program");
        let mut tx = self.pool.begin().await.map_err(into_domain)?;

        // The row lock serialises concurrent edits of the same program.
        let sql = format!(
            "SELECT {} FROM programs p WHERE p.id = $1 FOR UPDATE",
            PROGRAM_COLUMNS
        );
        let entity = sqlx::query_as::<_, ProgramEntity>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(into_domain)?
            .ok_or_else(DomainError::program_not_found)?;

        let members = sqlx::query_as::<_, ProgramMembershipEntity>(
            r#"
            SELECT program_id, user_id, status, responded_at, invited_at
            FROM program_memberships
            WHERE program_id = $1
            ORDER BY invited_at, user_id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(into_domain)?;

        let before = entity.into_program(members);
        let mut program = before.clone();
        // An error drops the transaction, which rolls it back.
        let changed = edit(&mut program)?;

        if changed {
            let result: Result<(), sqlx::Error> = async {
                sqlx::query(
                    r#"
                    UPDATE programs
                    SET name = $2, description = $3, workouts = $4, geo_activities = $5,
                        updated_at = $6, last_edited_by = $7, last_edited_at = $8
                    WHERE id = $1
                    "#,
                )
                .bind(program.id)
                .bind(&program.name)
                .bind(&program.description)
                .bind(Json(&program.workouts))
                .bind(Json(&program.geo_activities))
                .bind(program.updated_at)
                .bind(program.last_edited_by)
                .bind(program.last_edited_at)
                .execute(&mut *tx)
                .await?;

                for membership in &program.members {
                    if before.membership(membership.user_id) != Some(membership) {
                        Self::upsert_membership(&mut tx, membership).await?;
                    }
                }
                Ok(())
            }
            .await;
            result.map_err(into_domain)?;
        }

        let committed = tx.commit().await;
        timer.finish(&committed);
        committed.map_err(into_domain)?;

        Ok(EditOutcome { program, changed })
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        let timer = QueryTimer::new("delete_program");
        // Memberships and sessions go with the program via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(into_domain)?.rows_affected() > 0)
    }

    async fn ping(&self) -> bool {
        record_pool_metrics(&self.pool);
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
