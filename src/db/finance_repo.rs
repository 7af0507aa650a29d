// src/db/finance_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{CreateEntryPayload, EntryKind, FinancialEntry, UpdateEntryPayload},
};

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LANÇAMENTOS (base do DRE)
    // =========================================================================

    pub async fn create_entry<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        input: &CreateEntryPayload,
        created_by: Uuid,
    ) -> Result<FinancialEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, FinancialEntry>(
            r#"
            INSERT INTO financial_entries (
                company_id, project_id, kind, description, amount, competence_date, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.project_id)
        .bind(input.kind)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.competence_date)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    pub async fn list_entries<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
        kind: Option<EntryKind>,
    ) -> Result<Vec<FinancialEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, FinancialEntry>(
            r#"
            SELECT * FROM financial_entries
            WHERE company_id = $1
              AND competence_date BETWEEN $2 AND $3
              AND ($4::entry_kind IS NULL OR kind = $4)
            ORDER BY competence_date ASC, created_at ASC
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(until)
        .bind(kind)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }

    pub async fn update_entry<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        entry_id: Uuid,
        input: &UpdateEntryPayload,
    ) -> Result<Option<FinancialEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, FinancialEntry>(
            r#"
            UPDATE financial_entries SET
                project_id = COALESCE($3, project_id),
                kind = COALESCE($4, kind),
                description = COALESCE($5, description),
                amount = COALESCE($6, amount),
                competence_date = COALESCE($7, competence_date),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(entry_id)
        .bind(company_id)
        .bind(input.project_id)
        .bind(input.kind)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.competence_date)
        .fetch_optional(executor)
        .await?;

        Ok(entry)
    }

    pub async fn delete_entry<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        entry_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM financial_entries WHERE id = $1 AND company_id = $2")
            .bind(entry_id)
            .bind(company_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
