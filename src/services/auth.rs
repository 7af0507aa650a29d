// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

/// Gera o hash bcrypt fora do runtime assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Só depois da senha, para não revelar quais e-mails existem
        if !user.is_active {
            tracing::warn!("🚫 Login recusado para usuário inativo {}", user.id);
            return Err(AppError::UserInactive);
        }

        tracing::info!("🔑 Login de {} ({})", user.email, user.role.as_str());
        self.create_token(&user)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // Desativação vale imediatamente, mesmo com token ainda válido
        if !user.is_active {
            return Err(AppError::UserInactive);
        }
        Ok(user)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            company_id: user.company_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service() -> AuthService {
        // Pool preguiçosa: nenhum teste aqui chega a consultar o banco
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/portal_gestao_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool), "segredo-de-teste".to_string())
    }

    fn user(role: UserRole, company_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            company_id,
            email: "ana@acme.com".to_string(),
            full_name: "Ana".to_string(),
            role,
            is_active: true,
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_carries_role_and_company() {
        let service = service();
        let company = Uuid::new_v4();
        let user = user(UserRole::Admin, Some(company));

        let token = service.create_token(&user).unwrap();
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"segredo-de-teste"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(data.claims.sub, user.id);
        assert_eq!(data.claims.role, UserRole::Admin);
        assert_eq!(data.claims.company_id, Some(company));
        assert_eq!(data.claims.exp - data.claims.iat, 7 * 24 * 3600);
    }

    #[tokio::test]
    async fn tampered_token_is_rejected_before_touching_the_database() {
        let service = service();
        let result = service.validate_token("nao.e.um.jwt").await;
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_round_trips_through_bcrypt() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify("segredo123", &hashed).unwrap());
        assert!(!verify("outra", &hashed).unwrap());
    }
}
