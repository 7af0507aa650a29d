// src/services/tickets/oauth_api.rs

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    TicketSource,
    parse::{TicketColumn, canonical_column, cell_text, normalize_header},
    rows_to_tickets,
};
use crate::{
    common::error::AppError,
    models::sustentacao::{SustentacaoEmpresaConfig, Ticket},
};

// Renova o token um pouco antes de expirar
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const COLUMN_ORDER: [TicketColumn; 7] = [
    TicketColumn::Id,
    TicketColumn::Empresa,
    TicketColumn::Titulo,
    TicketColumn::Status,
    TicketColumn::Responsavel,
    TicketColumn::Data,
    TicketColumn::Horas,
];

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct OAuthTicketApiConfig {
    pub base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

/// API de chamados protegida por OAuth2 (client credentials).
#[derive(Clone)]
pub struct OAuthTicketApi {
    http: Client,
    config: OAuthTicketApiConfig,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl OAuthTicketApi {
    pub fn new(http: Client, config: OAuthTicketApiConfig) -> Self {
        Self {
            http,
            config,
            token: Arc::new(RwLock::new(None)),
        }
    }

    async fn access_token(&self) -> Result<String, AppError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if Instant::now() < token.expires_at {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        // Outra tarefa pode ter renovado enquanto esperávamos o lock
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        tracing::info!("🔐 Solicitando token da API de chamados");

        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if let Some(scope) = self.config.scope.as_deref() {
            form.push(("scope", scope));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::TicketSource(format!("falha ao obter token: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("❌ Token recusado pela API de chamados: {} - {}", status, body);
            return Err(AppError::TicketSource(format!("token recusado ({})", status)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::TicketSource(format!("resposta de token ilegível: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        let expires_at = Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }
}

/// Aceita `[...]`, `{"tickets": [...]}` ou `{"data": [...]}`.
fn ticket_objects(payload: Value) -> Vec<serde_json::Map<String, Value>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("tickets").or_else(|| obj.remove("data")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(obj),
            _ => None,
        })
        .collect()
}

/// Achata os objetos da API numa tabela com cabeçalho canônico.
fn objects_to_rows(objects: Vec<serde_json::Map<String, Value>>) -> Vec<Vec<String>> {
    let header: Vec<String> = ["id", "empresa", "titulo", "status", "responsavel", "data", "horas"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = vec![header];
    for obj in objects {
        let mut row = vec![String::new(); COLUMN_ORDER.len()];
        for (key, value) in obj {
            let Some(column) = canonical_column(&normalize_header(&key)) else {
                continue;
            };
            if let Some(idx) = COLUMN_ORDER.iter().position(|c| *c == column) {
                if row[idx].is_empty() {
                    row[idx] = cell_text(value);
                }
            }
        }
        rows.push(row);
    }
    rows
}

#[async_trait]
impl TicketSource for OAuthTicketApi {
    async fn fetch_tickets(
        &self,
        config: &SustentacaoEmpresaConfig,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Ticket>, AppError> {
        let token = self.access_token().await?;
        let url = format!("{}/tickets", self.config.base_url.trim_end_matches('/'));
        let (from_param, to_param) = (from.to_string(), until.to_string());

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("empresa", config.nome_empresa_fonte.as_str()),
                ("from", from_param.as_str()),
                ("to", to_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::TicketSource(format!("falha ao acessar a API de chamados: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            return Err(AppError::TicketSource("token expirado na API de chamados".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::TicketSource(format!("API de chamados respondeu {}: {}", status, body)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::TicketSource(format!("resposta da API de chamados ilegível: {}", e)))?;

        let rows = objects_to_rows(ticket_objects(payload));
        let tickets = rows_to_tickets(&rows, &config.nome_empresa_fonte, from, until);

        tracing::info!(
            "🎫 API de chamados: {} tickets de '{}' entre {} e {}",
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
            horas_contratadas: 10.0,
            data_inicio: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            data_fim: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            saldo_negativo: true,
            fonte: FonteTickets::Api,
            planilha_id: None,
            planilha_intervalo: None,
            nome_empresa_fonte: "ACME".to_string(),
            ativo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn api(server: &MockServer) -> OAuthTicketApi {
        OAuthTicketApi::new(
            Client::new(),
            OAuthTicketApiConfig {
                base_url: server.base_url(),
                token_url: server.url("/oauth/token"),
                client_id: "cliente".to_string(),
                client_secret: "segredo".to_string(),
                scope: None,
            },
        )
    }

    #[tokio::test]
    async fn token_is_cached_between_calls() {
        let server = MockServer::start_async().await;
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/oauth/token")
                    .body_contains("grant_type=client_credentials");
                then.status(200)
                    .json_body(json!({ "access_token": "tok-1", "token_type": "bearer", "expires_in": 3600 }));
            })
            .await;
        let tickets_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/tickets")
                    .header("Authorization", "Bearer tok-1")
                    .query_param("empresa", "ACME");
                then.status(200).json_body(json!({
                    "tickets": [
                        { "id": 7, "company": "ACME", "title": "Ajuste", "date": "2025-03-03", "hours": "01:45" },
                        { "id": 8, "company": "ACME", "title": "Sem data", "hours": 2 }
                    ]
                }));
            })
            .await;

        let source = api(&server);
        let from = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let until = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

        let first = source.fetch_tickets(&config(), from, until).await.unwrap();
        let second = source.fetch_tickets(&config(), from, until).await.unwrap();

        token_mock.assert_hits_async(1).await;
        tickets_mock.assert_hits_async(2).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "7");
        assert_eq!(first[0].horas, 1.75);
    }

    #[tokio::test]
    async fn unauthorized_response_drops_cached_token() {
        let server = MockServer::start_async().await;
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(200).json_body(json!({ "access_token": "tok-2", "expires_in": 3600 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tickets");
                then.status(401);
            })
            .await;

        let source = api(&server);
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert!(source.fetch_tickets(&config(), day, day).await.is_err());
        assert!(source.fetch_tickets(&config(), day, day).await.is_err());

        token_mock.assert_hits_async(2).await;
    }

    #[test]
    fn bare_arrays_and_wrapped_lists_are_accepted() {
        assert_eq!(ticket_objects(json!([{ "id": 1 }])).len(), 1);
        assert_eq!(ticket_objects(json!({ "data": [{ "id": 1 }, { "id": 2 }] })).len(), 2);
        assert!(ticket_objects(json!({ "outro": [] })).is_empty());
    }
}
