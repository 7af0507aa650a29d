// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

// Tabela (idioma, chave) -> mensagem. `{}` é substituído pelo argumento do erro.
const MESSAGES: &[(&str, &str, &str)] = &[
    ("pt", "validation", "Um ou mais campos são inválidos."),
    ("en", "validation", "One or more fields are invalid."),
    ("pt", "email_already_exists", "Este e-mail já está em uso."),
    ("en", "email_already_exists", "This e-mail is already in use."),
    ("pt", "invalid_credentials", "E-mail ou senha inválidos."),
    ("en", "invalid_credentials", "Invalid e-mail or password."),
    ("pt", "invalid_token", "Token de autenticação inválido ou ausente."),
    ("en", "invalid_token", "Missing or invalid authentication token."),
    ("pt", "user_inactive", "Usuário desativado."),
    ("en", "user_inactive", "User is deactivated."),
    ("pt", "user_not_found", "Usuário não encontrado."),
    ("en", "user_not_found", "User not found."),
    ("pt", "forbidden", "Você não tem permissão para realizar esta ação."),
    ("en", "forbidden", "You are not allowed to perform this action."),
    ("pt", "company_context_required", "O cabeçalho X-Company-ID é obrigatório."),
    ("en", "company_context_required", "The X-Company-ID header is required."),
    ("pt", "resource_not_found", "Recurso não encontrado: {}"),
    ("en", "resource_not_found", "Resource not found: {}"),
    ("pt", "license_limit_reached", "Limite de licenças do plano atingido: {}"),
    ("en", "license_limit_reached", "Plan license limit reached: {}"),
    ("pt", "invalid_parameter", "Parâmetro inválido: {}"),
    ("en", "invalid_parameter", "Invalid parameter: {}"),
    ("pt", "invalid_predecessor", "A tarefa predecessora deve pertencer ao mesmo projeto e ser diferente da tarefa."),
    ("en", "invalid_predecessor", "The predecessor must be another task of the same project."),
    ("pt", "dependency_cycle", "A dependência criaria um ciclo entre tarefas."),
    ("en", "dependency_cycle", "The dependency would create a cycle between tasks."),
    ("pt", "invalid_task_transition", "Transição de status não permitida a partir de '{}'."),
    ("en", "invalid_task_transition", "Status transition not allowed from '{}'."),
    ("pt", "invalid_delay_date", "A data real de conclusão deve ser posterior à data prevista."),
    ("en", "invalid_delay_date", "The actual end date must be after the planned end date."),
    ("pt", "delay_justification_required", "Conclusão em atraso exige justificativa."),
    ("en", "delay_justification_required", "Late completion requires a justification."),
    ("pt", "sustentacao_not_configured", "A sustentação não está configurada para esta empresa."),
    ("en", "sustentacao_not_configured", "Support hours are not configured for this company."),
    ("pt", "ticket_source", "Falha ao consultar a fonte de tickets: {}"),
    ("en", "ticket_source", "Failed to query the ticket source: {}"),
    ("pt", "ticket_source_rate_limited", "A fonte de tickets está limitando requisições. Tente novamente em instantes."),
    ("en", "ticket_source_rate_limited", "The ticket source is rate limiting requests. Try again shortly."),
    ("pt", "internal", "Ocorreu um erro inesperado."),
    ("en", "internal", "An unexpected error occurred."),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<(&'static str, &'static str), &'static str>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let messages = MESSAGES
            .iter()
            .map(|(lang, key, text)| ((*lang, *key), *text))
            .collect();
        Self { messages }
    }
}

impl I18nStore {
    /// Busca a mensagem no idioma pedido, caindo para português e depois para a própria chave.
    pub fn translate(&self, lang: &str, key: &str, arg: Option<&str>) -> String {
        let template = self
            .messages
            .iter()
            .find(|((l, k), _)| *l == lang && *k == key)
            .or_else(|| {
                self.messages
                    .iter()
                    .find(|((l, k), _)| *l == DEFAULT_LANG && *k == key)
            })
            .map(|(_, text)| *text)
            .unwrap_or(key);

        match arg {
            Some(arg) => template.replacen("{}", arg, 1),
            None => template.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::default();
        assert_eq!(
            store.translate("de", "forbidden", None),
            "Você não tem permissão para realizar esta ação."
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::default();
        assert_eq!(store.translate("en", "nao_existe", None), "nao_existe");
    }
}
