// src/handlers/finance.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::{
        dates::{month_end, month_start},
        db_utils::get_rls_connection,
        error::ApiError,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOrAbove, RequireRole},
        tenancy::TenantContext,
    },
    models::finance::{CreateEntryPayload, DreReport, EntryKind, FinancialEntry, UpdateEntryPayload},
};

/// Período (padrão: mês corrente) e tipo opcional.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFilter {
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
    pub kind: Option<EntryKind>,
}

impl PeriodFilter {
    fn range(&self) -> (NaiveDate, NaiveDate) {
        let today = Local::now().date_naive();
        (
            self.from.unwrap_or_else(|| month_start(today)),
            self.to.unwrap_or_else(|| month_end(today)),
        )
    }
}

// =============================================================================
//  LANÇAMENTOS
// =============================================================================

// POST /api/finance/entries
#[utoipa::path(
    post,
    path = "/api/finance/entries",
    tag = "Financeiro",
    request_body = CreateEntryPayload,
    responses(
        (status = 201, description = "Lançamento criado", body = FinancialEntry),
        (status = 400, description = "Dados inválidos")
    ),
    params(("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")),
    security(("api_jwt" = []))
)]
pub async fn create_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let entry = app_state
        .finance_service
        .create_entry(&mut *rls_conn, tenant.0, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// GET /api/finance/entries
#[utoipa::path(
    get,
    path = "/api/finance/entries",
    tag = "Financeiro",
    params(
        PeriodFilter,
        ("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")
    ),
    responses((status = 200, description = "Lançamentos do período", body = Vec<FinancialEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Query(filter): Query<PeriodFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (from, until) = filter.range();
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let entries = app_state
        .finance_service
        .list_entries(&mut *rls_conn, tenant.0, from, until, filter.kind)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}

// PUT /api/finance/entries/{id}
#[utoipa::path(
    put,
    path = "/api/finance/entries/{id}",
    tag = "Financeiro",
    params(("id" = Uuid, Path, description = "ID do lançamento")),
    request_body = UpdateEntryPayload,
    responses(
        (status = 200, description = "Lançamento atualizado", body = FinancialEntry),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<UpdateEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let entry = app_state
        .finance_service
        .update_entry(&mut *rls_conn, tenant.0, entry_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entry)))
}

// DELETE /api/finance/entries/{id}
#[utoipa::path(
    delete,
    path = "/api/finance/entries/{id}",
    tag = "Financeiro",
    params(("id" = Uuid, Path, description = "ID do lançamento")),
    responses(
        (status = 204, description = "Lançamento removido"),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .finance_service
        .delete_entry(&mut *rls_conn, tenant.0, entry_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  DRE
// =============================================================================

// GET /api/finance/dre
#[utoipa::path(
    get,
    path = "/api/finance/dre",
    tag = "Financeiro",
    params(PeriodFilter),
    responses((status = 200, description = "Demonstrativo do período", body = DreReport)),
    security(("api_jwt" = []))
)]
pub async fn get_dre(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Query(filter): Query<PeriodFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (from, until) = filter.range();
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .finance_service
        .dre(&mut *rls_conn, tenant.0, from, until)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/finance/dre/pdf
#[utoipa::path(
    get,
    path = "/api/finance/dre/pdf",
    tag = "Financeiro",
    params(PeriodFilter),
    responses(
        (status = 200, description = "DRE em PDF", content_type = "application/pdf"),
        (status = 500, description = "Fontes do PDF não encontradas")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dre_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Query(filter): Query<PeriodFilter>,
) -> Result<Response, ApiError> {
    let (from, until) = filter.range();
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .finance_service
        .dre_pdf(&mut *rls_conn, tenant.0, from, until)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Download direto no navegador
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"dre_{}_{}.pdf\"", from, until),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
