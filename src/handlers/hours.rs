// src/handlers/hours.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOrAbove, RequireRole},
        tenancy::TenantContext,
    },
    models::hours::{CreateConsumptionPayload, CreatePackagePayload, HourBalance, HourConsumption, HourPackage},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionFilter {
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

// =============================================================================
//  PACOTES
// =============================================================================

// POST /api/hours/packages
#[utoipa::path(
    post,
    path = "/api/hours/packages",
    tag = "Horas",
    request_body = CreatePackagePayload,
    responses(
        (status = 201, description = "Pacote criado (mensal substitui o vigente)", body = HourPackage),
        (status = 400, description = "Dados inválidos")
    ),
    params(("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")),
    security(("api_jwt" = []))
)]
pub async fn create_package(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Json(payload): Json<CreatePackagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let package = app_state
        .hours_service
        .create_package(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(package)))
}

// GET /api/hours/packages
#[utoipa::path(
    get,
    path = "/api/hours/packages",
    tag = "Horas",
    responses((status = 200, description = "Pacotes de horas", body = Vec<HourPackage>)),
    params(("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")),
    security(("api_jwt" = []))
)]
pub async fn list_packages(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let packages = app_state
        .hours_service
        .list_packages(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(packages)))
}

// =============================================================================
//  CONSUMO
// =============================================================================

// POST /api/hours/consumptions
#[utoipa::path(
    post,
    path = "/api/hours/consumptions",
    tag = "Horas",
    request_body = CreateConsumptionPayload,
    responses(
        (status = 201, description = "Consumo registrado", body = HourConsumption),
        (status = 400, description = "Horas em formato inválido")
    ),
    params(("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")),
    security(("api_jwt" = []))
)]
pub async fn create_consumption(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Json(payload): Json<CreateConsumptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let consumption = app_state
        .hours_service
        .create_consumption(&mut *rls_conn, tenant.0, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(consumption)))
}

// GET /api/hours/consumptions
#[utoipa::path(
    get,
    path = "/api/hours/consumptions",
    tag = "Horas",
    params(
        ConsumptionFilter,
        ("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")
    ),
    responses((status = 200, description = "Lançamentos de consumo", body = Vec<HourConsumption>)),
    security(("api_jwt" = []))
)]
pub async fn list_consumptions(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    Query(filter): Query<ConsumptionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let consumptions = app_state
        .hours_service
        .list_consumptions(&mut *rls_conn, tenant.0, filter.from, filter.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(consumptions)))
}

// GET /api/hours/balance
#[utoipa::path(
    get,
    path = "/api/hours/balance",
    tag = "Horas",
    responses((status = 200, description = "Saldo do pacote vigente ou da conta corrente", body = HourBalance)),
    params(("x-company-id" = Option<Uuid>, Header, description = "Obrigatório para super admin")),
    security(("api_jwt" = []))
)]
pub async fn get_balance(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let balance = app_state
        .hours_service
        .balance(&mut *rls_conn, tenant.0, Local::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(balance)))
}
