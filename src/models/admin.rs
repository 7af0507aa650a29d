// src/models/admin.rs

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Criação de administrador (console) ou de usuário do portal
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    /// Obrigatório para o super admin; ignorado para administradores de empresa.
    pub company_id: Option<Uuid>,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Carlos Lima")]
    pub full_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "carlos@acme.com.br")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub full_name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusPayload {
    pub is_active: bool,
}
