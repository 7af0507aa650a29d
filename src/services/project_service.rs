// src/services/project_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, ProjectRepository},
    models::project::{CreateProjectPayload, Project, ProjectStatus, UpdateProjectPayload},
};

fn check_dates(start: Option<chrono::NaiveDate>, end: Option<chrono::NaiveDate>) -> Result<(), AppError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            Err(AppError::InvalidParameter("startDate posterior a endDate".to_string()))
        }
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct ProjectService {
    repo: ProjectRepository,
    company_repo: CompanyRepository,
}

impl ProjectService {
    pub fn new(repo: ProjectRepository, company_repo: CompanyRepository) -> Self {
        Self { repo, company_repo }
    }

    /// Cria o projeto respeitando o `max_projects` da empresa.
    pub async fn create_project<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &CreateProjectPayload,
    ) -> Result<Project, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        payload.validate()?;
        check_dates(payload.start_date, payload.end_date)?;

        let mut tx = executor.begin().await?;

        let company = self
            .company_repo
            .find_by_id(&mut *tx, company_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("empresa".to_string()))?;

        // Propostas comerciais não consomem licença
        if payload.status != Some(ProjectStatus::CommercialProposal) {
            let active = self.repo.count_projects(&mut *tx, company_id).await?;
            if active >= company.max_projects as i64 {
                return Err(AppError::LicenseLimitReached(format!(
                    "{} de {} projetos",
                    active, company.max_projects
                )));
            }
        }

        let project = self.repo.create_project(&mut *tx, company_id, payload).await?;
        tx.commit().await?;

        tracing::info!("📁 Projeto '{}' criado na empresa {}", project.name, company_id);
        Ok(project)
    }

    pub async fn list_projects(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, AppError> {
        self.repo.list_projects(conn, company_id, status).await
    }

    pub async fn get_project(&self, conn: &mut PgConnection, company_id: Uuid, project_id: Uuid) -> Result<Project, AppError> {
        self.repo
            .find_by_id(conn, company_id, project_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("projeto".to_string()))
    }

    pub async fn update_project(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
        payload: &UpdateProjectPayload,
    ) -> Result<Project, AppError> {
        payload.validate()?;

        let current = self.get_project(&mut *conn, company_id, project_id).await?;
        check_dates(
            payload.start_date.or(current.start_date),
            payload.end_date.or(current.end_date),
        )?;

        self.repo
            .update_project(&mut *conn, company_id, project_id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("projeto".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn start_after_end_is_rejected() {
        let a = NaiveDate::from_ymd_opt(2025, 1, 10);
        let b = NaiveDate::from_ymd_opt(2025, 1, 5);

        assert!(check_dates(a, b).is_err());
        assert!(check_dates(b, a).is_ok());
        assert!(check_dates(None, b).is_ok());
    }
}
