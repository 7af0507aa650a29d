use sqlx::{Postgres, pool::PoolConnection};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Adquire uma conexão da pool e define as variáveis usadas pelas policies de RLS.
///
/// `false` no `set_config` faz o valor valer para a sessão; a pool roda
/// `RESET ALL` ao receber a conexão de volta.
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<PoolConnection<Postgres>, AppError> {
    let mut conn = get_user_connection(app_state, user).await?;

    sqlx::query("SELECT set_config('app.company_id', $1, false)")
        .bind(tenant_ctx.0.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}

/// Conexão só com a identidade do usuário (caixa de notificações).
pub(crate) async fn get_user_connection(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<PoolConnection<Postgres>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;

    sqlx::query("SELECT set_config('app.user_id', $1, false)")
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    sqlx::query("SELECT set_config('app.user_role', $1, false)")
        .bind(user.0.role.as_str())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}
