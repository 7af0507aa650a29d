// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "plan_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Basic,
    Professional,
    Enterprise,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    #[schema(example = "Acme Tecnologia Ltda")]
    pub name: String,
    #[schema(example = "12.345.678/0001-99")]
    pub document_number: Option<String>,
    #[schema(example = "financeiro@acme.com.br")]
    pub contact_email: Option<String>,
    pub plan_type: PlanType,

    // Licenciamento
    #[schema(example = 3)]
    pub max_admins: i32,
    #[schema(example = 20)]
    pub max_users: i32,
    #[schema(example = 10)]
    pub max_projects: i32,

    pub is_active: bool,

    // Snapshot de cobrança: nunca guardamos o número completo do cartão
    #[schema(example = "visa")]
    pub card_brand: Option<String>,
    #[schema(example = "4242")]
    pub card_last4: Option<String>,
    pub card_holder: Option<String>,
    pub billing_email: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    #[schema(example = "Acme Tecnologia Ltda")]
    pub name: String,
    pub document_number: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub contact_email: Option<String>,
    pub plan_type: PlanType,
    #[validate(range(min = 1, message = "Informe ao menos 1 administrador."))]
    pub max_admins: i32,
    #[validate(range(min = 0))]
    pub max_users: i32,
    #[validate(range(min = 0))]
    pub max_projects: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub name: Option<String>,
    pub document_number: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub contact_email: Option<String>,
    pub plan_type: Option<PlanType>,
    #[validate(range(min = 1))]
    pub max_admins: Option<i32>,
    #[validate(range(min = 0))]
    pub max_users: Option<i32>,
    #[validate(range(min = 0))]
    pub max_projects: Option<i32>,
    pub is_active: Option<bool>,
}

/// Dados de cartão recebidos do formulário de cobrança.
/// O número completo só existe em memória até ser mascarado.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillingPayload {
    #[validate(length(min = 12, max = 23, message = "Número de cartão inválido."))]
    #[schema(example = "4242 4242 4242 4242")]
    pub card_number: String,
    #[validate(length(min = 1, message = "O nome do titular é obrigatório."))]
    pub card_holder: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub billing_email: Option<String>,
}

/// Resultado do mascaramento: apenas o que pode ir para o banco.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingSnapshot {
    pub card_brand: String,
    pub card_last4: String,
}
