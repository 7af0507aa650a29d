// src/handlers/admins.rs

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, SuperAdminOnly},
        tenancy::{TenantContext, scoped_company},
    },
    models::{
        admin::{CreateUserPayload, UpdateUserPayload, UpdateUserStatusPayload},
        auth::{User, UserRole},
    },
};

// =============================================================================
//  ADMINISTRADORES DE EMPRESA (console do super admin)
// =============================================================================

// POST /api/admins
#[utoipa::path(
    post,
    path = "/api/admins",
    tag = "Administradores",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Administrador criado", body = User),
        (status = 403, description = "Limite de administradores atingido"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    params(("x-company-id" = Option<Uuid>, Header, description = "Empresa, quando não vier no corpo")),
    security(("api_jwt" = []))
)]
pub async fn create_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
    headers: HeaderMap,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let company_id = scoped_company(&user.0, &headers, payload.company_id).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    let admin = app_state
        .user_service
        .create_user(&mut *rls_conn, company_id, UserRole::Admin, &payload)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(admin)))
}

// GET /api/admins
#[utoipa::path(
    get,
    path = "/api/admins",
    tag = "Administradores",
    responses((status = 200, description = "Administradores da empresa", body = Vec<User>)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_admins(
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

    let admins = app_state
        .user_service
        .list_users(&mut *rls_conn, company_id, UserRole::Admin)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(admins)))
}

// PUT /api/admins/{id}
#[utoipa::path(
    put,
    path = "/api/admins/{id}",
    tag = "Administradores",
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Administrador atualizado", body = User),
        (status = 404, description = "Administrador não encontrado"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do administrador"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
    headers: HeaderMap,
    Path(admin_id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let company_id = scoped_company(&user.0, &headers, None).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    let admin = app_state
        .user_service
        .update_user(&mut *rls_conn, company_id, admin_id, UserRole::Admin, &payload)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(admin)))
}

// PUT /api/admins/{id}/status
#[utoipa::path(
    put,
    path = "/api/admins/{id}/status",
    tag = "Administradores",
    request_body = UpdateUserStatusPayload,
    responses(
        (status = 200, description = "Administrador ativado/desativado", body = User),
        (status = 403, description = "Limite de administradores atingido ao reativar")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do administrador"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_admin_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<SuperAdminOnly>,
    headers: HeaderMap,
    Path(admin_id): Path<Uuid>,
    Json(payload): Json<UpdateUserStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let company_id = scoped_company(&user.0, &headers, None).map_err(to_api)?;
    let mut rls_conn = get_rls_connection(&app_state, &TenantContext(company_id), &user)
        .await
        .map_err(to_api)?;

    let admin = app_state
        .user_service
        .set_status(&mut *rls_conn, company_id, admin_id, UserRole::Admin, payload.is_active)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(admin)))
}
