// src/handlers/sustentacao.rs

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::{
        dates::{month_start, parse_month},
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
        pagination::{Page, PageParams},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOrAbove, RequireRole, SuperAdminOnly},
        tenancy::{TenantContext, scoped_company},
    },
    models::sustentacao::{
        FecharMesPayload, SaldoMensal, SaldoSustentacao, SustentacaoEmpresaConfig, Ticket,
        UpsertSustentacaoConfigPayload,
    },
};

// Rotas só com `auth_guard`: o super admin pode informar a empresa no corpo.

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MesQuery {
    /// Mês no formato YYYY-MM (padrão: mês corrente)
    #[param(example = "2025-03")]
    pub mes: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl MesQuery {
    fn mes(&self) -> Result<NaiveDate, AppError> {
        match self.mes.as_deref() {
            Some(value) => parse_month(value),
            None => Ok(month_start(Local::now().date_naive())),
        }
    }

    fn page_params(&self) -> PageParams {
        PageParams { page: self.page, page_size: self.page_size }
    }
}

// =============================================================================
//  CONFIGURAÇÃO DO CONTRATO
// =============================================================================

// GET /api/sustentacao/config
#[utoipa::path(
    get,
    path = "/api/sustentacao/config",
    tag = "Sustentação",
    responses(
        (status = 200, description = "Contrato de sustentação", body = SustentacaoEmpresaConfig),
        (status = 404, description = "Sustentação não configurada")
    ),
    params(("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")),
    security(("api_jwt" = []))
)]
pub async fn get_config(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let company_id = scoped_company(&user.0, &headers, None).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    let config = app_state
        .sustentacao_service
        .get_config(&mut *rls_conn, company_id)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(config)))
}

// PUT /api/sustentacao/config
#[utoipa::path(
    put,
    path = "/api/sustentacao/config",
    tag = "Sustentação",
    request_body = UpsertSustentacaoConfigPayload,
    responses(
        (status = 200, description = "Contrato gravado", body = SustentacaoEmpresaConfig),
        (status = 400, description = "Vigência ou fonte inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_config(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
    headers: HeaderMap,
    Json(payload): Json<UpsertSustentacaoConfigPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let company_id = scoped_company(&user.0, &headers, payload.company_id).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    let config = app_state
        .sustentacao_service
        .upsert_config(&mut *rls_conn, company_id, &payload)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(config)))
}

// DELETE /api/sustentacao/config
#[utoipa::path(
    delete,
    path = "/api/sustentacao/config",
    tag = "Sustentação",
    responses(
        (status = 204, description = "Contrato removido"),
        (status = 404, description = "Sustentação não configurada")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn delete_config(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let company_id = scoped_company(&user.0, &headers, None).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    app_state
        .sustentacao_service
        .delete_config(&mut *rls_conn, company_id)
        .await
        .map_err(to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/sustentacao/configs
#[utoipa::path(
    get,
    path = "/api/sustentacao/configs",
    tag = "Sustentação",
    responses((status = 200, description = "Contratos de todas as empresas", body = Vec<SustentacaoEmpresaConfig>)),
    security(("api_jwt" = []))
)]
pub async fn list_configs(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<SuperAdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let configs = app_state
        .sustentacao_service
        .list_configs()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(configs)))
}

// =============================================================================
//  SALDO E TICKETS
// =============================================================================

// GET /api/sustentacao/saldo?mes=YYYY-MM
#[utoipa::path(
    get,
    path = "/api/sustentacao/saldo",
    tag = "Sustentação",
    params(
        MesQuery,
        ("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")
    ),
    responses(
        (status = 200, description = "Saldo acumulado e disponível no mês", body = SaldoSustentacao),
        (status = 404, description = "Sustentação não configurada"),
        (status = 502, description = "Falha na fonte de tickets")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_saldo(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Query(query): Query<MesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let mes = query.mes().map_err(to_api)?;
    let company_id = scoped_company(&user.0, &headers, None).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    let saldo = app_state
        .sustentacao_service
        .saldo(&mut *rls_conn, company_id, mes)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(saldo)))
}

// GET /api/sustentacao/tickets?mes=YYYY-MM&page=&pageSize=
#[utoipa::path(
    get,
    path = "/api/sustentacao/tickets",
    tag = "Sustentação",
    params(
        MesQuery,
        ("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")
    ),
    responses(
        (status = 200, description = "Tickets do mês, paginados", body = Page<Ticket>),
        (status = 502, description = "Falha na fonte de tickets")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Query(query): Query<MesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let mes = query.mes().map_err(to_api)?;
    let company_id = scoped_company(&user.0, &headers, None).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    let page = app_state
        .sustentacao_service
        .tickets_do_mes(&mut *rls_conn, company_id, mes, &query.page_params())
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(page)))
}

// POST /api/sustentacao/saldos/fechar
#[utoipa::path(
    post,
    path = "/api/sustentacao/saldos/fechar",
    tag = "Sustentação",
    request_body = FecharMesPayload,
    responses(
        (status = 200, description = "Mês fechado", body = SaldoMensal),
        (status = 400, description = "Mês fora da vigência")
    ),
    security(("api_jwt" = []))
)]
pub async fn fechar_mes(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    headers: HeaderMap,
    Json(payload): Json<FecharMesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let mes = parse_month(&payload.mes).map_err(to_api)?;
    let company_id = scoped_company(&user.0, &headers, payload.company_id).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    let saldo = app_state
        .sustentacao_service
        .fechar_mes(&mut *rls_conn, company_id, mes, user.0.id)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(saldo)))
}
