// src/handlers/tasks.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Local;
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
    models::task::{
        CompleteTaskPayload, CreateTaskPayload, DependencyCheck, GanttTask, RegisterDelayPayload,
        SetDependencyPayload, Task, TaskUpdateResponse, UpdateTaskPayload,
    },
};

// =============================================================================
//  GANTT
// =============================================================================

// POST /api/projects/{id}/tasks
#[utoipa::path(
    post,
    path = "/api/projects/{id}/tasks",
    tag = "Tarefas",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    request_body = CreateTaskPayload,
    responses(
        (status = 201, description = "Tarefa criada", body = Task),
        (status = 422, description = "Predecessora inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let task = app_state
        .task_service
        .create_task(&mut *rls_conn, tenant.0, project_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(task)))
}

// GET /api/projects/{id}/tasks
#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks",
    tag = "Tarefas",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses((status = 200, description = "Tarefas em ordem de Gantt", body = Vec<GanttTask>)),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tasks = app_state
        .task_service
        .list_gantt(&mut *rls_conn, tenant.0, project_id, Local::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(tasks)))
}

// PUT /api/tasks/{id}
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "Tarefas",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = UpdateTaskPayload,
    responses(
        (status = 200, description = "Tarefa atualizada (com avisos de dependência, se houver)", body = TaskUpdateResponse),
        (status = 422, description = "Conclusão deve usar /complete ou /delay")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_task(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .task_service
        .update_task(&mut *rls_conn, tenant.0, task_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}

// =============================================================================
//  DEPENDÊNCIAS
// =============================================================================

// PUT /api/tasks/{id}/dependency
#[utoipa::path(
    put,
    path = "/api/tasks/{id}/dependency",
    tag = "Tarefas",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = SetDependencyPayload,
    responses(
        (status = 200, description = "Dependência gravada", body = TaskUpdateResponse),
        (status = 422, description = "Predecessora inválida ou ciclo")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_dependency(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    _guard: RequireRole<AdminOrAbove>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<SetDependencyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .task_service
        .set_dependency(&mut *rls_conn, tenant.0, task_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/tasks/{id}/dependency-status
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/dependency-status",
    tag = "Tarefas",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses((status = 200, description = "Selo livre/bloqueada/liberada", body = DependencyCheck)),
    security(("api_jwt" = []))
)]
pub async fn dependency_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let check = app_state
        .task_service
        .dependency_status(&mut *rls_conn, tenant.0, task_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(check)))
}

// =============================================================================
//  CONCLUSÃO E ATRASO
// =============================================================================

// POST /api/tasks/{id}/complete
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/complete",
    tag = "Tarefas",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = CompleteTaskPayload,
    responses(
        (status = 200, description = "Tarefa concluída no prazo", body = Task),
        (status = 400, description = "Conclusão após o prazo exige justificativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_task(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<CompleteTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let task = app_state
        .task_service
        .complete_task(&mut *rls_conn, tenant.0, task_id, &payload, Local::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(task)))
}

// POST /api/tasks/{id}/delay
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/delay",
    tag = "Tarefas",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = RegisterDelayPayload,
    responses(
        (status = 200, description = "Tarefa concluída com atraso justificado", body = Task),
        (status = 400, description = "Data real não é posterior à prevista ou justificativa vazia"),
        (status = 422, description = "Status atual não permite a transição")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_delay(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<RegisterDelayPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let task = app_state
        .task_service
        .register_delay(&mut *rls_conn, tenant.0, task_id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(task)))
}
