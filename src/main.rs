//src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, tenancy::tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG sobrescreve; padrão: info para o app
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portal_gestao=info,info")))
        .with_target(false)
        .compact()
        .init();

    let app_state = AppState::new().await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Varredura de prazos em segundo plano
    tokio::spawn(
        app_state
            .notification_service
            .clone()
            .run_deadline_scanner(app_state.settings.deadline_scan_interval),
    );

    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Rotas autenticadas sem empresa obrigatória (console, sustentação, notificações)
    let account_routes = Router::new()
        .route("/users/me", get(handlers::auth::get_me))
        .route(
            "/companies",
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            "/companies/{id}",
            get(handlers::companies::get_company).put(handlers::companies::update_company),
        )
        .route("/companies/{id}/billing", put(handlers::companies::update_billing))
        .route(
            "/admins",
            post(handlers::admins::create_admin).get(handlers::admins::list_admins),
        )
        .route("/admins/{id}", put(handlers::admins::update_admin))
        .route("/admins/{id}/status", put(handlers::admins::set_admin_status))
        .route(
            "/sustentacao/config",
            get(handlers::sustentacao::get_config)
                .put(handlers::sustentacao::upsert_config)
                .delete(handlers::sustentacao::delete_config),
        )
        .route("/sustentacao/configs", get(handlers::sustentacao::list_configs))
        .route("/sustentacao/saldo", get(handlers::sustentacao::get_saldo))
        .route("/sustentacao/tickets", get(handlers::sustentacao::list_tickets))
        .route("/sustentacao/saldos/fechar", post(handlers::sustentacao::fechar_mes))
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route("/notifications/unread-count", get(handlers::notifications::unread_count))
        .route("/notifications/read-all", put(handlers::notifications::mark_all_read))
        .route("/notifications/{id}/read", put(handlers::notifications::mark_read))
        .route("/notifications/stream", get(handlers::notifications::stream))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Rotas da empresa: Auth + Tenancy
    let tenant_routes = Router::new()
        .route(
            "/users",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route(
            "/projects",
            post(handlers::projects::create_project).get(handlers::projects::list_projects),
        )
        .route(
            "/projects/{id}",
            get(handlers::projects::get_project).put(handlers::projects::update_project),
        )
        .route("/projects/{id}/summary", get(handlers::projects::project_summary))
        .route(
            "/projects/{id}/tasks",
            post(handlers::tasks::create_task).get(handlers::tasks::list_tasks),
        )
        .route("/tasks/{id}", put(handlers::tasks::update_task))
        .route("/tasks/{id}/dependency", put(handlers::tasks::set_dependency))
        .route("/tasks/{id}/dependency-status", get(handlers::tasks::dependency_status))
        .route("/tasks/{id}/complete", post(handlers::tasks::complete_task))
        .route("/tasks/{id}/delay", post(handlers::tasks::register_delay))
        .route(
            "/hours/packages",
            post(handlers::hours::create_package).get(handlers::hours::list_packages),
        )
        .route(
            "/hours/consumptions",
            post(handlers::hours::create_consumption).get(handlers::hours::list_consumptions),
        )
        .route("/hours/balance", get(handlers::hours::get_balance))
        .route(
            "/finance/entries",
            post(handlers::finance::create_entry).get(handlers::finance::list_entries),
        )
        .route(
            "/finance/entries/{id}",
            put(handlers::finance::update_entry).delete(handlers::finance::delete_entry),
        )
        .route("/finance/dre", get(handlers::finance::get_dre))
        .route("/finance/dre/pdf", get(handlers::finance::get_dre_pdf))
        // A última camada roda primeiro: auth_guard, depois tenant_guard
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .merge(account_routes)
        .merge(tenant_routes);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .with_state(app_state.clone());

    let listener = TcpListener::bind(&app_state.settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    tracing::info!("📚 Documentação em http://{}/swagger-ui", app_state.settings.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
