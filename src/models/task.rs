// src/models/task.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Delayed,
    Completed,
    CompletedDelayed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Delayed => "delayed",
            TaskStatus::Completed => "completed",
            TaskStatus::CompletedDelayed => "completed_delayed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Concluída, com ou sem atraso.
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::CompletedDelayed)
    }

    /// Ainda conta para prazo (nem concluída nem cancelada).
    pub fn is_open(&self) -> bool {
        !self.is_done() && *self != TaskStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "dependency_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    Independent,
    FinishToStart,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "Levantamento de requisitos")]
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub status: TaskStatus,

    #[schema(value_type = Option<String>, format = Date, example = "2025-02-03")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = String, format = Date, example = "2025-02-14")]
    pub end_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub actual_end_date: Option<NaiveDate>,

    // Fluxo de justificativa de atraso
    #[schema(value_type = Option<String>, format = Date)]
    pub original_end_date: Option<NaiveDate>,
    pub delay_justification: Option<String>,
    pub delay_created_at: Option<DateTime<Utc>>,
    pub delay_created_by: Option<Uuid>,

    // Dependências (Gantt)
    pub dependency_type: DependencyType,
    pub predecessor_task_id: Option<Uuid>,

    #[schema(example = 16.0)]
    pub estimated_hours: Option<f64>,
    pub position: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    #[validate(length(min = 1, message = "O título da tarefa é obrigatório."))]
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    #[validate(range(min = 0.0, message = "Horas estimadas não podem ser negativas."))]
    pub estimated_hours: Option<f64>,
    pub dependency_type: Option<DependencyType>,
    pub predecessor_task_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    #[validate(length(min = 1, message = "O título da tarefa é obrigatório."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, message = "Horas estimadas não podem ser negativas."))]
    pub estimated_hours: Option<f64>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetDependencyPayload {
    pub dependency_type: DependencyType,
    pub predecessor_task_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskPayload {
    /// Quando omitida, usa a data de hoje.
    #[schema(value_type = Option<String>, format = Date)]
    pub actual_end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDelayPayload {
    #[schema(value_type = String, format = Date, example = "2025-02-20")]
    pub actual_end_date: NaiveDate,
    #[validate(length(min = 1, message = "A justificativa é obrigatória."))]
    #[schema(example = "Cliente atrasou a entrega dos acessos ao ambiente.")]
    pub justification: String,
}

/// Selo exibido no Gantt para a dependência da tarefa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DependencyBadge {
    Livre,     // Sem dependência
    Bloqueada, // Predecessora ainda não concluída
    Liberada,  // Predecessora concluída
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyCheck {
    pub can_start: bool,
    pub badge: DependencyBadge,
    pub predecessor_task_id: Option<Uuid>,
    pub predecessor_status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    OnTime,
    Delayed,
    Early,
}

// Tarefa + informações derivadas para a visão de Gantt
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GanttTask {
    #[serde(flatten)]
    pub task: Task,
    pub schedule_status: ScheduleStatus,
    pub delay_days: i64,
    pub dependency: DependencyCheck,
}

/// Resposta de atualização: a tarefa salva e avisos não bloqueantes.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateResponse {
    pub task: Task,
    pub warnings: Vec<String>,
}
