// src/db/company_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::company::{BillingSnapshot, Company, CreateCompanyPayload, UpdateCompanyPayload},
};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        input: &CreateCompanyPayload,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (
                name, document_number, contact_email, plan_type,
                max_admins, max_users, max_projects
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.document_number)
        .bind(&input.contact_email)
        .bind(input.plan_type)
        .bind(input.max_admins)
        .bind(input.max_users)
        .bind(input.max_projects)
        .fetch_one(executor)
        .await?;

        Ok(company)
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(company)
    }

    pub async fn update_company<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &UpdateCompanyPayload,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                document_number = COALESCE($3, document_number),
                contact_email = COALESCE($4, contact_email),
                plan_type = COALESCE($5, plan_type),
                max_admins = COALESCE($6, max_admins),
                max_users = COALESCE($7, max_users),
                max_projects = COALESCE($8, max_projects),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.document_number)
        .bind(&input.contact_email)
        .bind(input.plan_type)
        .bind(input.max_admins)
        .bind(input.max_users)
        .bind(input.max_projects)
        .bind(input.is_active)
        .fetch_optional(executor)
        .await?;

        Ok(company)
    }

    pub async fn update_billing<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        snapshot: &BillingSnapshot,
        card_holder: &str,
        billing_email: Option<&str>,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                card_brand = $2,
                card_last4 = $3,
                card_holder = $4,
                billing_email = COALESCE($5, billing_email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&snapshot.card_brand)
        .bind(&snapshot.card_last4)
        .bind(card_holder)
        .bind(billing_email)
        .fetch_optional(executor)
        .await?;

        Ok(company)
    }
}
