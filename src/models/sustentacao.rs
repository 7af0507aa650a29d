// src/models/sustentacao.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "fonte_tickets", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FonteTickets {
    Planilha, // Planilha compartilhada (API de valores)
    Api,      // API de chamados protegida por OAuth2
}

// Contrato de sustentação da empresa
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SustentacaoEmpresaConfig {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = 20.0)]
    pub horas_contratadas: f64,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub data_inicio: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-12-31")]
    pub data_fim: NaiveDate,
    /// Quando falso, meses com consumo acima do contratado não geram saldo negativo.
    pub saldo_negativo: bool,
    pub fonte: FonteTickets,
    #[schema(example = "1AbCdEf...")]
    pub planilha_id: Option<String>,
    #[schema(example = "Chamados!A1:H")]
    pub planilha_intervalo: Option<String>,
    /// Nome da empresa como aparece na fonte de tickets.
    #[schema(example = "ACME")]
    pub nome_empresa_fonte: String,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSustentacaoConfigPayload {
    /// Obrigatório para o super admin.
    pub company_id: Option<Uuid>,
    #[validate(range(min = 0.0, message = "Horas contratadas não podem ser negativas."))]
    pub horas_contratadas: f64,
    #[schema(value_type = String, format = Date)]
    pub data_inicio: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub data_fim: NaiveDate,
    #[serde(default)]
    pub saldo_negativo: bool,
    pub fonte: FonteTickets,
    pub planilha_id: Option<String>,
    pub planilha_intervalo: Option<String>,
    #[validate(length(min = 1, message = "Informe o nome da empresa na fonte de tickets."))]
    pub nome_empresa_fonte: String,
    #[serde(default = "default_true")]
    pub ativo: bool,
}

fn default_true() -> bool {
    true
}

// Fotografia de um mês já fechado
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaldoMensal {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2025-02-01")]
    pub mes: NaiveDate,
    pub horas_contratadas: f64,
    pub horas_consumidas: f64,
    pub saldo: f64,
    pub saldo_acumulado: f64,
    pub fechado_em: DateTime<Utc>,
    pub fechado_por: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FecharMesPayload {
    pub company_id: Option<Uuid>,
    #[schema(example = "2025-02")]
    pub mes: String,
}

/// Ticket normalizado, independente da fonte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub empresa: String,
    pub titulo: Option<String>,
    pub status: Option<String>,
    pub responsavel: Option<String>,
    #[schema(value_type = String, format = Date)]
    pub data: NaiveDate,
    /// Horas decimais (ex.: "02:30" vira 2.5).
    pub horas: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrigemSaldo {
    Fechado,   // Veio de um SaldoMensal
    Calculado, // Calculado a partir dos tickets
}

// Linha do histórico de saldo
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaldoMes {
    #[schema(value_type = String, format = Date)]
    pub mes: NaiveDate,
    pub horas_contratadas: f64,
    pub horas_consumidas: f64,
    pub saldo: f64,
    pub saldo_acumulado: f64,
    pub origem: OrigemSaldo,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaldoSustentacao {
    #[schema(value_type = String, format = Date)]
    pub mes_referencia: NaiveDate,
    pub horas_contratadas: f64,
    pub saldo_negativo: bool,
    pub dentro_da_vigencia: bool,
    pub saldo_acumulado: f64,
    pub saldo_final_proximo_mes: f64,
    pub horas_disponiveis_mes: f64,
    pub horas_consumidas_mes: f64,
    pub saldo_mes_atual: f64,
    pub historico: Vec<SaldoMes>,
}
