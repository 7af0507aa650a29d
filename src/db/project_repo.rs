// src/db/project_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::project::{CreateProjectPayload, Project, ProjectStatus, UpdateProjectPayload},
};

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_project<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        input: &CreateProjectPayload,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                company_id, name, description, status, budget,
                start_date, end_date, predicted_end_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.status.unwrap_or(ProjectStatus::Planning))
        .bind(input.budget)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.predicted_end_date)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    pub async fn list_projects<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE company_id = $1 AND ($2::project_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }

    pub async fn count_projects<'e, E>(&self, executor: E, company_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Propostas comerciais e cancelados não consomem licença
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM projects
            WHERE company_id = $1 AND status NOT IN ('cancelled', 'commercial_proposal')
            "#,
        )
        .bind(company_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let project = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE id = $1 AND company_id = $2",
        )
        .bind(project_id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    pub async fn update_project<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        project_id: Uuid,
        input: &UpdateProjectPayload,
    ) -> Result<Option<Project>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                budget = COALESCE($6, budget),
                start_date = COALESCE($7, start_date),
                end_date = COALESCE($8, end_date),
                predicted_end_date = COALESCE($9, predicted_end_date),
                actual_end_date = COALESCE($10, actual_end_date),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(company_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.status)
        .bind(input.budget)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.predicted_end_date)
        .bind(input.actual_end_date)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }
}
