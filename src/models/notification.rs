// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    DeadlineWarning, // Prazo se aproximando
    Urgent,          // Vence hoje ou amanhã
    Overdue,         // Prazo vencido
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub kind: NotificationKind,
    #[schema(example = "Tarefa vence amanhã")]
    pub title: String,
    pub message: String,
    /// Entidade de origem (ex.: id da tarefa), usada para evitar alertas duplicados.
    pub reference_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Dados para inserir uma notificação.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub reference_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread: i64,
}

// Tarefa com prazo próximo, já com os destinatários resolvidos
#[derive(Debug, Clone, FromRow)]
pub struct DeadlineCandidate {
    pub task_id: Uuid,
    pub task_title: String,
    pub project_name: String,
    pub company_id: Uuid,
    pub end_date: chrono::NaiveDate,
    pub recipient_id: Uuid,
    pub recipient_email: String,
    pub recipient_name: String,
}
