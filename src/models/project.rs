// src/models/project.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    Homologation,
    OnHold,
    Delayed,
    Completed,
    Cancelled,
    CommercialProposal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "Implantação ERP")]
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[schema(example = "45000.00")]
    pub budget: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date, example = "2025-01-06")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date, example = "2025-06-30")]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub predicted_end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub actual_end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectPayload {
    #[validate(length(min = 1, message = "O nome do projeto é obrigatório."))]
    #[schema(example = "Implantação ERP")]
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub predicted_end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectPayload {
    #[validate(length(min = 1, message = "O nome do projeto é obrigatório."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub predicted_end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub actual_end_date: Option<NaiveDate>,
}

// Indicadores do projeto (cards do topo da tela de Gantt)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project_id: Uuid,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub cancelled_tasks: u32,
    pub on_time: u32,
    pub delayed: u32,
    pub early: u32,
    #[schema(example = 62.5)]
    pub progress_percent: f64,
}
