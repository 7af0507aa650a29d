// src/db/task_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::task::{CreateTaskPayload, DependencyType, Task, TaskStatus, UpdateTaskPayload},
};

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_task<'e, E>(
        &self,
        executor: E,
        project_id: Uuid,
        input: &CreateTaskPayload,
    ) -> Result<Task, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // A posição é o próximo número livre do projeto
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (
                project_id, title, description, assignee_id, start_date, end_date,
                estimated_hours, dependency_type, predecessor_task_id, position
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM tasks WHERE project_id = $1)
            )
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.assignee_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.estimated_hours)
        .bind(input.dependency_type.unwrap_or(DependencyType::Independent))
        .bind(input.predecessor_task_id)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Tarefas do projeto na ordem do Gantt.
    pub async fn list_by_project<'e, E>(
        &self,
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Task>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE project_id = $1
            ORDER BY COALESCE(start_date, end_date) ASC, position ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }

    /// Busca a tarefa garantindo que o projeto pertence à empresa.
    pub async fn find_in_company<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Task>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.* FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.id = $1 AND p.company_id = $2
            "#,
        )
        .bind(task_id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    pub async fn update_task<'e, E>(
        &self,
        executor: E,
        task_id: Uuid,
        input: &UpdateTaskPayload,
    ) -> Result<Task, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                assignee_id = COALESCE($4, assignee_id),
                status = COALESCE($5, status),
                start_date = COALESCE($6, start_date),
                end_date = COALESCE($7, end_date),
                estimated_hours = COALESCE($8, estimated_hours),
                position = COALESCE($9, position),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.assignee_id)
        .bind(input.status)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.estimated_hours)
        .bind(input.position)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    pub async fn set_dependency<'e, E>(
        &self,
        executor: E,
        task_id: Uuid,
        dependency_type: DependencyType,
        predecessor_task_id: Option<Uuid>,
    ) -> Result<Task, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET
                dependency_type = $2,
                predecessor_task_id = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(dependency_type)
        .bind(predecessor_task_id)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    pub async fn complete_task<'e, E>(
        &self,
        executor: E,
        task_id: Uuid,
        actual_end_date: NaiveDate,
    ) -> Result<Task, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET
                status = $2,
                actual_end_date = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(TaskStatus::Completed)
        .bind(actual_end_date)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Grava a conclusão com atraso. O `WHERE` repete as pré-condições para
    /// que duas submissões simultâneas não sobrescrevam a justificativa.
    pub async fn register_delay<'e, E>(
        &self,
        executor: E,
        task_id: Uuid,
        actual_end_date: NaiveDate,
        justification: &str,
        user_id: Uuid,
    ) -> Result<Option<Task>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET
                status = 'completed_delayed',
                actual_end_date = $2,
                original_end_date = end_date,
                delay_justification = $3,
                delay_created_at = NOW(),
                delay_created_by = $4,
                updated_at = NOW()
            WHERE id = $1
              AND status IN ('in_progress', 'delayed')
              AND $2 > end_date
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(actual_end_date)
        .bind(justification)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Marca como `delayed` as tarefas abertas cujo prazo já passou.
    pub async fn mark_overdue_as_delayed(&self, today: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks SET status = 'delayed', updated_at = NOW()
            WHERE status IN ('todo', 'in_progress') AND end_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
