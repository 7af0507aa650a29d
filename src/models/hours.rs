// src/models/hours.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "package_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    Monthly, // Renovado todo mês; só um "atual" por empresa
    OneTime, // Pacote avulso
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "accounting_model", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountingModel {
    Standard,       // Saldo do pacote vigente
    CurrentAccount, // Conta corrente: sobras e excessos acumulam entre pacotes
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourPackage {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub package_type: PackageType,
    pub accounting_model: AccountingModel,
    #[schema(example = 40.0)]
    pub hours_contracted: f64,
    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub valid_from: NaiveDate,
    #[schema(value_type = Option<String>, format = Date, example = "2025-03-31")]
    pub valid_until: Option<NaiveDate>,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourConsumption {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub package_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    #[schema(example = 2.5)]
    pub hours: f64,
    #[schema(value_type = String, format = Date)]
    pub consumed_on: NaiveDate,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackagePayload {
    pub package_type: PackageType,
    pub accounting_model: AccountingModel,
    #[validate(range(min = 0.5, message = "O pacote deve ter horas contratadas."))]
    pub hours_contracted: f64,
    #[schema(value_type = String, format = Date)]
    pub valid_from: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsumptionPayload {
    pub package_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    /// Aceita "HH:MM" ou decimal ("2.5" / "2,5").
    #[validate(length(min = 1, message = "Informe as horas consumidas."))]
    #[schema(example = "02:30")]
    pub hours: String,
    #[schema(value_type = String, format = Date)]
    pub consumed_on: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UsageAlert {
    Normal,
    Atencao,  // >= 80%
    Esgotado, // >= 100%
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourBalance {
    pub accounting_model: Option<AccountingModel>,
    pub current_package_id: Option<Uuid>,
    pub hours_contracted: f64,
    pub hours_consumed: f64,
    /// Pode ser negativo na conta corrente.
    pub hours_remaining: f64,
    pub usage_percent: f64,
    pub alert: UsageAlert,
}
