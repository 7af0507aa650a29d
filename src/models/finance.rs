// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "entry_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    ReceitaBruta,
    Deducao,
    Custo,
    DespesaOperacional,
    ReceitaFinanceira,
    DespesaFinanceira,
    Imposto,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialEntry {
    pub id: Uuid,

    #[schema(ignore)]
    pub company_id: Uuid,

    pub project_id: Option<Uuid>,
    pub kind: EntryKind,

    #[schema(example = "Mensalidade de sustentação")]
    pub description: String,

    // Sempre positivo; o sinal vem do tipo do lançamento
    #[schema(example = "8500.00")]
    pub amount: Decimal,

    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub competence_date: NaiveDate,

    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryPayload {
    pub project_id: Option<Uuid>,
    pub kind: EntryKind,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,
    #[schema(example = "8500.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date)]
    pub competence_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryPayload {
    pub project_id: Option<Uuid>,
    pub kind: Option<EntryKind>,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub competence_date: Option<NaiveDate>,
}

// Demonstrativo de Resultados do Exercício
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DreReport {
    #[schema(value_type = String, format = Date)]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub period_end: NaiveDate,
    pub receita_bruta: Decimal,
    pub deducoes: Decimal,
    pub receita_liquida: Decimal,
    pub custos: Decimal,
    pub lucro_bruto: Decimal,
    pub despesas_operacionais: Decimal,
    pub resultado_operacional: Decimal,
    pub receitas_financeiras: Decimal,
    pub despesas_financeiras: Decimal,
    pub resultado_antes_impostos: Decimal,
    pub impostos: Decimal,
    pub lucro_liquido: Decimal,
    /// Percentual sobre a receita líquida, com 2 casas.
    pub margem_liquida: Decimal,
}
