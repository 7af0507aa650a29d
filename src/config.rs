// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    common::i18n::I18nStore,
    db::{
        CompanyRepository, FinanceRepository, HoursRepository, NotificationRepository, ProjectRepository,
        SustentacaoRepository, TaskRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        company_service::CompanyService,
        finance_service::FinanceService,
        hours_service::HoursService,
        mailer::{MailRelayConfig, Mailer},
        notification_service::NotificationService,
        project_service::ProjectService,
        sustentacao_service::SustentacaoService,
        task_service::TaskService,
        tickets::{
            TicketSource, TicketSources,
            oauth_api::{OAuthTicketApi, OAuthTicketApiConfig},
            planilha::SheetsTicketSource,
        },
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub mail: Option<MailRelayConfig>,
    pub sheets_base_url: String,
    pub sheets_api_key: Option<String>,
    pub sheets_retry_delay: Duration,
    pub ticket_api: Option<OAuthTicketApiConfig>,
    pub deadline_warning_days: i64,
    pub deadline_scan_interval: Duration,
    pub pdf_fonts_dir: PathBuf,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} inválida: '{}'", key, value)),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mail = match (optional("MAIL_RELAY_URL"), optional("MAIL_RELAY_API_KEY")) {
            (Some(url), Some(api_key)) => Some(MailRelayConfig {
                url,
                api_key,
                from: optional("MAIL_FROM").unwrap_or_else(|| "nao-responda@portal.local".to_string()),
            }),
            _ => None,
        };

        let ticket_api = match (
            optional("TICKET_API_BASE_URL"),
            optional("TICKET_API_TOKEN_URL"),
            optional("TICKET_API_CLIENT_ID"),
            optional("TICKET_API_CLIENT_SECRET"),
        ) {
            (Some(base_url), Some(token_url), Some(client_id), Some(client_secret)) => Some(OAuthTicketApiConfig {
                base_url,
                token_url,
                client_id,
                client_secret,
                scope: optional("TICKET_API_SCOPE"),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            mail,
            sheets_base_url: optional("SHEETS_BASE_URL")
                .unwrap_or_else(|| "https://sheets.googleapis.com".to_string()),
            sheets_api_key: optional("SHEETS_API_KEY"),
            sheets_retry_delay: Duration::from_millis(parsed("SHEETS_RETRY_DELAY_MS", 2000)?),
            ticket_api,
            deadline_warning_days: parsed("DEADLINE_WARNING_DAYS", 3)?,
            deadline_scan_interval: Duration::from_secs(parsed("DEADLINE_SCAN_INTERVAL_SECS", 3600)?),
            pdf_fonts_dir: PathBuf::from(optional("PDF_FONTS_DIR").unwrap_or_else(|| "./fonts".to_string())),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,
    pub settings: Arc<Settings>,

    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub user_service: UserService,
    pub project_service: ProjectService,
    pub task_service: TaskService,
    pub hours_service: HoursService,
    pub finance_service: FinanceService,
    pub sustentacao_service: SustentacaoService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let settings = Settings::from_env()?;

        let db_pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            // As variáveis de RLS são de sessão: limpa antes de devolver à pool
            .after_release(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("RESET ALL").execute(&mut *conn).await?;
                    Ok(true)
                })
            })
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let project_repo = ProjectRepository::new(db_pool.clone());
        let task_repo = TaskRepository::new(db_pool.clone());

        // --- Fontes de tickets ---
        let planilha: Option<Arc<dyn TicketSource>> = match &settings.sheets_api_key {
            Some(api_key) => Some(Arc::new(SheetsTicketSource::new(
                http.clone(),
                &settings.sheets_base_url,
                api_key,
                settings.sheets_retry_delay,
            ))),
            None => {
                tracing::warn!("📄 SHEETS_API_KEY não configurada: fonte 'planilha' indisponível");
                None
            }
        };
        let api: Option<Arc<dyn TicketSource>> = match &settings.ticket_api {
            Some(config) => Some(Arc::new(OAuthTicketApi::new(http.clone(), config.clone()))),
            None => {
                tracing::warn!("🔌 TICKET_API_* não configurada: fonte 'api' indisponível");
                None
            }
        };

        let mailer = Mailer::new(http.clone(), settings.mail.clone());

        // --- Serviços ---
        let auth_service = AuthService::new(user_repo.clone(), settings.jwt_secret.clone());
        let company_service = CompanyService::new(company_repo.clone());
        let user_service = UserService::new(user_repo, company_repo.clone());
        let project_service = ProjectService::new(project_repo.clone(), company_repo.clone());
        let task_service = TaskService::new(task_repo.clone(), project_repo);
        let hours_service = HoursService::new(HoursRepository::new(db_pool.clone()));
        let finance_service = FinanceService::new(
            FinanceRepository::new(db_pool.clone()),
            company_repo,
            settings.pdf_fonts_dir.clone(),
        );
        let sustentacao_service = SustentacaoService::new(
            SustentacaoRepository::new(db_pool.clone()),
            TicketSources::new(planilha, api),
        );
        let notification_service = NotificationService::new(
            NotificationRepository::new(db_pool.clone()),
            task_repo,
            mailer,
            settings.deadline_warning_days,
        );

        Ok(Self {
            db_pool,
            i18n_store: I18nStore::default(),
            settings: Arc::new(settings),
            auth_service,
            company_service,
            user_service,
            project_service,
            task_service,
            hours_service,
            finance_service,
            sustentacao_service,
            notification_service,
        })
    }
}
