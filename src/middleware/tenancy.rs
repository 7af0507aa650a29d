// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{User, UserRole},
};

// Cabeçalho com que o super admin escolhe a empresa
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// Empresa em que a requisição opera.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

/// Resolve a empresa da requisição.
///
/// Administradores e usuários ficam presos à própria empresa; o cabeçalho é
/// ignorado para eles. O super admin precisa informar `X-Company-ID`.
pub fn resolve_company(user: &User, headers: &HeaderMap) -> Result<Uuid, AppError> {
    if user.role != UserRole::SuperAdmin {
        return user.company_id.ok_or(AppError::Forbidden);
    }

    let value = headers
        .get(COMPANY_ID_HEADER)
        .ok_or(AppError::CompanyContextRequired)?;

    value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| AppError::InvalidParameter(COMPANY_ID_HEADER.to_string()))
}

/// Para rotas do console em que o super admin informa a empresa no corpo.
pub fn scoped_company(user: &User, headers: &HeaderMap, requested: Option<Uuid>) -> Result<Uuid, AppError> {
    match requested {
        Some(company_id) if user.role == UserRole::SuperAdmin => Ok(company_id),
        _ => resolve_company(user, headers),
    }
}

// Roda depois do `auth_guard`
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AppError::InvalidToken)
        .map_err(to_api)?;

    let company_id = resolve_company(&user.0, request.headers()).map_err(to_api)?;

    request.extensions_mut().insert(TenantContext(company_id));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or(AppError::CompanyContextRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn user(role: UserRole, company_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            company_id,
            email: "x@y.com".to_string(),
            full_name: "X".to_string(),
            role,
            is_active: true,
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_is_pinned_to_own_company() {
        let own = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COMPANY_ID_HEADER,
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        );

        let resolved = resolve_company(&user(UserRole::Admin, Some(own)), &headers).unwrap();
        assert_eq!(resolved, own);
    }

    #[test]
    fn super_admin_needs_header() {
        let root = user(UserRole::SuperAdmin, None);
        assert!(matches!(
            resolve_company(&root, &HeaderMap::new()),
            Err(AppError::CompanyContextRequired)
        ));

        let target = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(COMPANY_ID_HEADER, HeaderValue::from_str(&target.to_string()).unwrap());
        assert_eq!(resolve_company(&root, &headers).unwrap(), target);

        let from_body = Uuid::new_v4();
        assert_eq!(scoped_company(&root, &headers, Some(from_body)).unwrap(), from_body);

        headers.insert(COMPANY_ID_HEADER, HeaderValue::from_static("nao-e-uuid"));
        assert!(matches!(
            resolve_company(&root, &headers),
            Err(AppError::InvalidParameter(_))
        ));
    }
}
