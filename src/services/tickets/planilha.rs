// src/services/tickets/planilha.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use super::{TicketSource, parse::cell_text, rows_to_tickets};
use crate::{
    common::error::AppError,
    models::sustentacao::{SustentacaoEmpresaConfig, Ticket},
};

const DEFAULT_RANGE: &str = "A1:Z";

// Resposta do endpoint de valores: matriz de células, cabeçalho na primeira linha
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Lê chamados de uma planilha compartilhada pela API de valores.
#[derive(Clone)]
pub struct SheetsTicketSource {
    http: Client,
    base_url: String,
    api_key: String,
    retry_delay: Duration,
}

impl SheetsTicketSource {
    pub fn new(http: Client, base_url: &str, api_key: &str, retry_delay: Duration) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry_delay,
        }
    }

    fn values_url(&self, planilha_id: &str, intervalo: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::TicketSource(format!("URL da API de planilhas inválida: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| AppError::TicketSource("URL da API de planilhas inválida".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", planilha_id, "values", intervalo]);

        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// GET com uma única nova tentativa em caso de 429.
    async fn fetch_rows(&self, url: Url) -> Result<Vec<Vec<String>>, AppError> {
        let mut retried = false;

        loop {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(|e| AppError::TicketSource(format!("falha ao acessar a planilha: {}", e)))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retried {
                    tracing::error!("❌ Planilha respondeu 429 novamente, desistindo");
                    return Err(AppError::TicketSourceRateLimited);
                }
                tracing::warn!("⏳ Planilha respondeu 429, nova tentativa em {:?}", self.retry_delay);
                retried = true;
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::TicketSource(format!("planilha respondeu {}: {}", status, body)));
            }

            let payload: ValuesResponse = response
                .json()
                .await
                .map_err(|e| AppError::TicketSource(format!("resposta da planilha ilegível: {}", e)))?;

            return Ok(payload
                .values
                .into_iter()
                .map(|row| row.into_iter().map(cell_text).collect())
                .collect());
        }
    }
}

#[async_trait]
impl TicketSource for SheetsTicketSource {
    async fn fetch_tickets(
        &self,
        config: &SustentacaoEmpresaConfig,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Ticket>, AppError> {
        let planilha_id = config
            .planilha_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::TicketSource("planilha não informada na configuração".to_string()))?;

        let intervalo = config
            .planilha_intervalo
            .as_deref()
            .filter(|range| !range.trim().is_empty())
            .unwrap_or(DEFAULT_RANGE);

        let url = self.values_url(planilha_id, intervalo)?;
        let rows = self.fetch_rows(url).await?;

        let tickets = rows_to_tickets(&rows, &config.nome_empresa_fonte, from, until);
        tracing::info!(
            "📄 Planilha {}: {} linhas, {} tickets de '{}' entre {} e {}",
            planilha_id,
            rows.len().saturating_sub(1),
            tickets.len(),
            config.nome_empresa_fonte,
            from,
            until
        );

        Ok(tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sustentacao::FonteTickets;
    use chrono::Utc;
    use httpmock::prelude::*;
    use serde_json::json;
    use uuid::Uuid;

    fn config() -> SustentacaoEmpresaConfig {
        SustentacaoEmpresaConfig {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            horas_contratadas: 20.0,
            data_inicio: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            data_fim: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            saldo_negativo: false,
            fonte: FonteTickets::Planilha,
            planilha_id: Some("planilha-1".to_string()),
            planilha_intervalo: Some("Chamados!A1:H".to_string()),
            nome_empresa_fonte: "ACME".to_string(),
            ativo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn source(server: &MockServer) -> SheetsTicketSource {
        SheetsTicketSource::new(Client::new(), &server.base_url(), "chave", Duration::from_millis(10))
    }

    #[tokio::test]
    async fn reads_values_and_filters_by_company() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/planilha-1/values/Chamados!A1:H")
                    .query_param("key", "chave");
                then.status(200).json_body(json!({
                    "range": "Chamados!A1:H3",
                    "values": [
                        ["ID", "Empresa", "Data", "Horas"],
                        ["1", "ACME", "10/02/2025", "01:30"],
                        ["2", "Outra", "11/02/2025", "3"],
                        [3, "ACME", "12/02/2025", 2]
                    ]
                }));
            })
            .await;

        let from = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let until = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        let tickets = source(&server).fetch_tickets(&config(), from, until).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].horas, 1.5);
        assert_eq!(tickets[1].id, "3");
        assert_eq!(tickets[1].horas, 2.0);
    }

    #[tokio::test]
    async fn rate_limit_is_retried_exactly_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v4/spreadsheets/planilha-1/values/Chamados!A1:H");
                then.status(429);
            })
            .await;

        let from = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let until = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        let result = source(&server).fetch_tickets(&config(), from, until).await;

        mock.assert_hits_async(2).await;
        assert!(matches!(result, Err(AppError::TicketSourceRateLimited)));
    }

    #[tokio::test]
    async fn missing_spreadsheet_id_is_rejected() {
        let server = MockServer::start_async().await;
        let mut cfg = config();
        cfg.planilha_id = None;

        let from = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let result = source(&server).fetch_tickets(&cfg, from, from).await;

        assert!(matches!(result, Err(AppError::TicketSource(_))));
    }
}
