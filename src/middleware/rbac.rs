// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::UserRole,
};

/// Conjunto de papéis aceitos por uma rota.
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
}

/// Extrator que recusa a requisição quando o papel do usuário não é aceito.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        if !T::allows(user.0.role) {
            tracing::warn!("🚫 {} ({}) sem permissão para a rota", user.0.email, user.0.role.as_str());
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS
// ---

pub struct SuperAdminOnly;
impl RoleDef for SuperAdminOnly {
    fn allows(role: UserRole) -> bool {
        role == UserRole::SuperAdmin
    }
}

pub struct AdminOrAbove;
impl RoleDef for AdminOrAbove {
    fn allows(role: UserRole) -> bool {
        matches!(role, UserRole::SuperAdmin | UserRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_sets() {
        assert!(SuperAdminOnly::allows(UserRole::SuperAdmin));
        assert!(!SuperAdminOnly::allows(UserRole::Admin));
        assert!(AdminOrAbove::allows(UserRole::Admin));
        assert!(!AdminOrAbove::allows(UserRole::Client));
    }
}
