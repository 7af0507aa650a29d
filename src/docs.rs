// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Empresas ---
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::update_company,
        handlers::companies::update_billing,

        // --- Administradores / Usuários ---
        handlers::admins::create_admin,
        handlers::admins::list_admins,
        handlers::admins::update_admin,
        handlers::admins::set_admin_status,
        handlers::users::create_user,
        handlers::users::list_users,

        // --- Projetos ---
        handlers::projects::create_project,
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::project_summary,

        // --- Tarefas ---
        handlers::tasks::create_task,
        handlers::tasks::list_tasks,
        handlers::tasks::update_task,
        handlers::tasks::set_dependency,
        handlers::tasks::dependency_status,
        handlers::tasks::complete_task,
        handlers::tasks::register_delay,

        // --- Horas ---
        handlers::hours::create_package,
        handlers::hours::list_packages,
        handlers::hours::create_consumption,
        handlers::hours::list_consumptions,
        handlers::hours::get_balance,

        // --- Financeiro ---
        handlers::finance::create_entry,
        handlers::finance::list_entries,
        handlers::finance::update_entry,
        handlers::finance::delete_entry,
        handlers::finance::get_dre,
        handlers::finance::get_dre_pdf,

        // --- Sustentação ---
        handlers::sustentacao::get_config,
        handlers::sustentacao::upsert_config,
        handlers::sustentacao::delete_config,
        handlers::sustentacao::list_configs,
        handlers::sustentacao::get_saldo,
        handlers::sustentacao::list_tickets,
        handlers::sustentacao::fechar_mes,

        // --- Notificações ---
        handlers::notifications::list_notifications,
        handlers::notifications::unread_count,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,
        handlers::notifications::stream,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Empresas ---
            models::company::PlanType,
            models::company::Company,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,
            models::company::UpdateBillingPayload,
            models::admin::CreateUserPayload,
            models::admin::UpdateUserPayload,
            models::admin::UpdateUserStatusPayload,

            // --- Projetos / Tarefas ---
            models::project::ProjectStatus,
            models::project::Project,
            models::project::CreateProjectPayload,
            models::project::UpdateProjectPayload,
            models::project::ProjectSummary,
            models::task::TaskStatus,
            models::task::DependencyType,
            models::task::Task,
            models::task::CreateTaskPayload,
            models::task::UpdateTaskPayload,
            models::task::SetDependencyPayload,
            models::task::CompleteTaskPayload,
            models::task::RegisterDelayPayload,
            models::task::DependencyBadge,
            models::task::DependencyCheck,
            models::task::ScheduleStatus,
            models::task::GanttTask,
            models::task::TaskUpdateResponse,

            // --- Horas ---
            models::hours::PackageType,
            models::hours::AccountingModel,
            models::hours::HourPackage,
            models::hours::HourConsumption,
            models::hours::CreatePackagePayload,
            models::hours::CreateConsumptionPayload,
            models::hours::UsageAlert,
            models::hours::HourBalance,

            // --- Financeiro ---
            models::finance::EntryKind,
            models::finance::FinancialEntry,
            models::finance::CreateEntryPayload,
            models::finance::UpdateEntryPayload,
            models::finance::DreReport,

            // --- Sustentação ---
            models::sustentacao::FonteTickets,
            models::sustentacao::SustentacaoEmpresaConfig,
            models::sustentacao::UpsertSustentacaoConfigPayload,
            models::sustentacao::SaldoMensal,
            models::sustentacao::FecharMesPayload,
            models::sustentacao::Ticket,
            models::sustentacao::OrigemSaldo,
            models::sustentacao::SaldoMes,
            models::sustentacao::SaldoSustentacao,

            // --- Notificações ---
            models::notification::NotificationKind,
            models::notification::Notification,
            models::notification::UnreadCount,
            crate::common::pagination::PageWindow,
        )
    ),
    tags(
        (name = "Auth", description = "Login e dados do usuário"),
        (name = "Empresas", description = "Console do super admin: empresas, plano e cobrança"),
        (name = "Administradores", description = "Administradores das empresas"),
        (name = "Usuários", description = "Usuários do portal do cliente"),
        (name = "Projetos", description = "Projetos e indicadores"),
        (name = "Tarefas", description = "Gantt, dependências e justificativa de atraso"),
        (name = "Horas", description = "Pacotes de horas e consumo"),
        (name = "Financeiro", description = "Lançamentos e DRE"),
        (name = "Sustentação", description = "Saldo de horas de sustentação e tickets"),
        (name = "Notificações", description = "Caixa de notificações e tempo real")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
