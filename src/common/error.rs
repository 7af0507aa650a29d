use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erros da camada de serviço. Cada variante tem uma chave de tradução em `i18n.rs`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    UserInactive,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Empresa não informada")]
    CompanyContextRequired,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Limite de licenças atingido: {0}")]
    LicenseLimitReached(String),

    #[error("Parâmetro inválido: {0}")]
    InvalidParameter(String),

    // --- Tarefas ---
    #[error("Tarefa predecessora inválida")]
    InvalidPredecessor,

    #[error("Dependência circular entre tarefas")]
    DependencyCycle,

    #[error("Transição de status inválida a partir de {0}")]
    InvalidTaskTransition(String),

    #[error("Data real de conclusão deve ser posterior à data prevista")]
    InvalidDelayDate,

    #[error("Justificativa de atraso obrigatória")]
    DelayJustificationRequired,

    // --- Sustentação ---
    #[error("Sustentação não configurada para a empresa")]
    SustentacaoNotConfigured,

    #[error("Falha na fonte de tickets: {0}")]
    TicketSource(String),

    #[error("Fonte de tickets recusou por limite de requisições")]
    TicketSourceRateLimited,

    // --- Infra ---
    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de cliente HTTP: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Status HTTP e chave de tradução de cada variante.
    fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "email_already_exists"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::UserInactive => (StatusCode::FORBIDDEN, "user_inactive"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::CompanyContextRequired => (StatusCode::BAD_REQUEST, "company_context_required"),
            AppError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "resource_not_found"),
            AppError::LicenseLimitReached(_) => (StatusCode::FORBIDDEN, "license_limit_reached"),
            AppError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "invalid_parameter"),
            AppError::InvalidPredecessor => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_predecessor"),
            AppError::DependencyCycle => (StatusCode::UNPROCESSABLE_ENTITY, "dependency_cycle"),
            AppError::InvalidTaskTransition(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_task_transition"),
            AppError::InvalidDelayDate => (StatusCode::BAD_REQUEST, "invalid_delay_date"),
            AppError::DelayJustificationRequired => (StatusCode::BAD_REQUEST, "delay_justification_required"),
            AppError::SustentacaoNotConfigured => (StatusCode::NOT_FOUND, "sustentacao_not_configured"),
            AppError::TicketSource(_) => (StatusCode::BAD_GATEWAY, "ticket_source"),
            AppError::TicketSourceRateLimited => (StatusCode::BAD_GATEWAY, "ticket_source_rate_limited"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    /// Argumento interpolado na mensagem traduzida (`{}`), quando houver.
    fn message_arg(&self) -> Option<&str> {
        match self {
            AppError::ResourceNotFound(arg)
            | AppError::LicenseLimitReached(arg)
            | AppError::InvalidParameter(arg)
            | AppError::InvalidTaskTransition(arg)
            | AppError::TicketSource(arg) => Some(arg.as_str()),
            _ => None,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, no idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        } else if status == StatusCode::BAD_GATEWAY {
            tracing::warn!("Falha em serviço externo: {}", self);
        }

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let text = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string());
                            Value::String(text)
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError {
            status,
            error: store.translate(&locale.0, key, self.message_arg()),
            details,
        }
    }
}

// Erro "pronto para o cliente": status + mensagem já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Usado pelos middlewares, que não têm acesso ao idioma negociado.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_localized_with_argument() {
        let store = I18nStore::default();
        let api = AppError::ResourceNotFound("Projeto".into())
            .to_api_error(&Locale("en".into()), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Resource not found: Projeto");
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::default();
        let api = AppError::InternalServerError(anyhow::anyhow!("pool exausto"))
            .to_api_error(&Locale("pt".into()), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("pool"));
    }

    #[test]
    fn rate_limit_maps_to_bad_gateway() {
        let api = AppError::TicketSourceRateLimited
            .to_api_error(&Locale::default(), &I18nStore::default());
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
    }
}
