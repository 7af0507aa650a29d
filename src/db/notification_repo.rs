// src/db/notification_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notification::{DeadlineCandidate, NewNotification, Notification, NotificationKind},
};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        input: &NewNotification,
    ) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, company_id, kind, title, message, reference_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(input.company_id)
        .bind(input.kind)
        .bind(&input.title)
        .bind(&input.message)
        .bind(input.reference_id)
        .fetch_one(executor)
        .await?;

        Ok(notification)
    }

    pub async fn list_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;

        Ok(notifications)
    }

    pub async fn count_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    pub async fn mark_read<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read<'e, E>(&self, executor: E, user_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  VARREDURA DE PRAZOS (roda fora de requisição, direto na pool)
    // =========================================================================

    /// Tarefas abertas com prazo até `until`, uma linha por destinatário:
    /// o responsável, ou os administradores ativos da empresa quando não há responsável.
    pub async fn deadline_candidates(&self, until: NaiveDate) -> Result<Vec<DeadlineCandidate>, AppError> {
        let candidates = sqlx::query_as::<_, DeadlineCandidate>(
            r#"
            SELECT
                t.id AS task_id,
                t.title AS task_title,
                p.name AS project_name,
                p.company_id,
                t.end_date,
                u.id AS recipient_id,
                u.email AS recipient_email,
                u.full_name AS recipient_name
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            JOIN users u ON u.is_active AND (
                u.id = t.assignee_id
                OR (t.assignee_id IS NULL AND u.company_id = p.company_id AND u.role = 'admin')
            )
            WHERE t.status NOT IN ('completed', 'completed_delayed', 'cancelled')
              AND p.status NOT IN ('cancelled', 'completed', 'on_hold')
              AND t.end_date <= $1
            ORDER BY t.end_date ASC
            "#,
        )
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(candidates)
    }

    /// Alertas de prazo já gravados em `[from, until)`: (usuário, tarefa, tipo).
    pub async fn deadline_alerts_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, Uuid, NotificationKind)>, AppError> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, NotificationKind)>(
            r#"
            SELECT user_id, reference_id, kind FROM notifications
            WHERE reference_id IS NOT NULL
              AND kind IN ('deadline_warning', 'urgent', 'overdue')
              AND created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn insert_with_pool(&self, input: &NewNotification) -> Result<Notification, AppError> {
        self.insert(&self.pool, input).await
    }
}
