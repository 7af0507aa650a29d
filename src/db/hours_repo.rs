// src/db/hours_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::hours::{CreatePackagePayload, HourConsumption, HourPackage},
};

#[derive(Clone)]
pub struct HoursRepository {
    pool: PgPool,
}

impl HoursRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PACOTES
    // =========================================================================

    /// Tira o status de "atual" do pacote mensal vigente da empresa.
    pub async fn deactivate_current_monthly<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE hour_packages SET is_current = FALSE
            WHERE company_id = $1 AND package_type = 'monthly' AND is_current
            "#,
        )
        .bind(company_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn create_package<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        input: &CreatePackagePayload,
    ) -> Result<HourPackage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let package = sqlx::query_as::<_, HourPackage>(
            r#"
            INSERT INTO hour_packages (
                company_id, package_type, accounting_model,
                hours_contracted, valid_from, valid_until, is_current
            )
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.package_type)
        .bind(input.accounting_model)
        .bind(input.hours_contracted)
        .bind(input.valid_from)
        .bind(input.valid_until)
        .fetch_one(executor)
        .await?;

        Ok(package)
    }

    pub async fn list_packages<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<HourPackage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let packages = sqlx::query_as::<_, HourPackage>(
            "SELECT * FROM hour_packages WHERE company_id = $1 ORDER BY valid_from ASC, created_at ASC",
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(packages)
    }

    // =========================================================================
    //  CONSUMO
    // =========================================================================

    pub async fn create_consumption<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        package_id: Option<Uuid>,
        project_id: Option<Uuid>,
        task_id: Option<Uuid>,
        hours: f64,
        consumed_on: NaiveDate,
        description: Option<&str>,
        created_by: Uuid,
    ) -> Result<HourConsumption, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Sem pacote explícito, o consumo vai para o pacote atual da empresa
        let consumption = sqlx::query_as::<_, HourConsumption>(
            r#"
            INSERT INTO hour_consumptions (
                company_id, package_id, project_id, task_id,
                hours, consumed_on, description, created_by
            )
            VALUES (
                $1,
                COALESCE($2, (
                    SELECT id FROM hour_packages
                    WHERE company_id = $1 AND is_current
                    ORDER BY valid_from DESC LIMIT 1
                )),
                $3, $4, $5, $6, $7, $8
            )
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(package_id)
        .bind(project_id)
        .bind(task_id)
        .bind(hours)
        .bind(consumed_on)
        .bind(description)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(consumption)
    }

    pub async fn list_consumptions<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<HourConsumption>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let consumptions = sqlx::query_as::<_, HourConsumption>(
            r#"
            SELECT * FROM hour_consumptions
            WHERE company_id = $1
              AND ($2::date IS NULL OR consumed_on >= $2)
              AND ($3::date IS NULL OR consumed_on <= $3)
            ORDER BY consumed_on DESC, created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(until)
        .fetch_all(executor)
        .await?;

        Ok(consumptions)
    }
}
