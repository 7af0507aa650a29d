// src/services/user_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, UserRepository},
    models::{
        admin::{CreateUserPayload, UpdateUserPayload},
        auth::{User, UserRole},
        company::Company,
    },
    services::auth::hash_password,
};

/// Limite de licenças da empresa para o papel.
pub fn license_limit(company: &Company, role: UserRole) -> Option<i64> {
    match role {
        UserRole::Admin => Some(company.max_admins as i64),
        UserRole::Client => Some(company.max_users as i64),
        UserRole::SuperAdmin => None,
    }
}

fn ensure_license(company: &Company, role: UserRole, active_count: i64) -> Result<(), AppError> {
    match license_limit(company, role) {
        Some(limit) if active_count >= limit => Err(AppError::LicenseLimitReached(format!(
            "{} de {} ({})",
            active_count,
            limit,
            role.as_str()
        ))),
        _ => Ok(()),
    }
}

/// Administradores e usuários do portal de uma empresa.
#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    company_repo: CompanyRepository,
}

impl UserService {
    pub fn new(repo: UserRepository, company_repo: CompanyRepository) -> Self {
        Self { repo, company_repo }
    }

    async fn active_company(&self, conn: &mut PgConnection, company_id: Uuid) -> Result<Company, AppError> {
        let company = self
            .company_repo
            .find_by_id(conn, company_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("empresa".to_string()))?;

        if !company.is_active {
            return Err(AppError::Forbidden);
        }
        Ok(company)
    }

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        role: UserRole,
        payload: &CreateUserPayload,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        payload.validate()?;

        // Hash fora da transação: não toca no banco
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = executor.begin().await?;

        let company = self.active_company(&mut *tx, company_id).await?;
        let active = self.repo.count_by_role(&mut *tx, company_id, role).await?;
        ensure_license(&company, role, active)?;

        if self.repo.email_in_use(&mut *tx, &payload.email, None).await? {
            return Err(AppError::EmailAlreadyExists);
        }

        let user = self
            .repo
            .create_user(
                &mut *tx,
                Some(company_id),
                payload.email.trim(),
                payload.full_name.trim(),
                role,
                &password_hash,
            )
            .await?;

        tx.commit().await?;

        tracing::info!("👤 Usuário {} ({}) criado na empresa {}", user.email, role.as_str(), company_id);
        Ok(user)
    }

    pub async fn list_users(&self, conn: &mut PgConnection, company_id: Uuid, role: UserRole) -> Result<Vec<User>, AppError> {
        self.repo.list_by_role(conn, company_id, role).await
    }

    async fn find_with_role(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<User, AppError> {
        self.repo
            .find_in_company(conn, company_id, user_id)
            .await?
            .filter(|u| u.role == role)
            .ok_or(AppError::UserNotFound)
    }

    pub async fn update_user(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        user_id: Uuid,
        role: UserRole,
        payload: &UpdateUserPayload,
    ) -> Result<User, AppError> {
        payload.validate()?;
        self.find_with_role(&mut *conn, company_id, user_id, role).await?;

        if let Some(email) = payload.email.as_deref() {
            if self.repo.email_in_use(&mut *conn, email, Some(user_id)).await? {
                return Err(AppError::EmailAlreadyExists);
            }
        }

        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        self.repo
            .update_user(
                &mut *conn,
                user_id,
                payload.full_name.as_deref().map(str::trim),
                payload.email.as_deref().map(str::trim),
                password_hash.as_deref(),
            )
            .await
    }

    /// Ativa/desativa. Reativar consome licença de novo.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
        role: UserRole,
        is_active: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let user = self.find_with_role(&mut *tx, company_id, user_id, role).await?;
        if user.is_active == is_active {
            return Ok(user);
        }

        if is_active {
            let company = self.active_company(&mut *tx, company_id).await?;
            let active = self.repo.count_by_role(&mut *tx, company_id, role).await?;
            ensure_license(&company, role, active)?;
        }

        let user = self.repo.set_active(&mut *tx, user_id, is_active).await?;
        tx.commit().await?;

        tracing::info!(
            "{} Usuário {} {}",
            if is_active { "🟢" } else { "🔴" },
            user.email,
            if is_active { "ativado" } else { "desativado" }
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::PlanType;
    use chrono::Utc;

    fn company(max_admins: i32, max_users: i32) -> Company {
        Company {
            id: Uuid::new_v4(),
            name: "ACME".to_string(),
            document_number: None,
            contact_email: None,
            plan_type: PlanType::Basic,
            max_admins,
            max_users,
            max_projects: 5,
            is_active: true,
            card_brand: None,
            card_last4: None,
            card_holder: None,
            billing_email: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn license_limits_per_role() {
        let acme = company(2, 10);

        assert!(ensure_license(&acme, UserRole::Admin, 1).is_ok());
        assert!(matches!(
            ensure_license(&acme, UserRole::Admin, 2),
            Err(AppError::LicenseLimitReached(_))
        ));
        assert!(ensure_license(&acme, UserRole::Client, 9).is_ok());
        assert!(ensure_license(&acme, UserRole::Client, 10).is_err());
        assert!(ensure_license(&acme, UserRole::SuperAdmin, 1000).is_ok());
    }
}
