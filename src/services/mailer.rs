// src/services/mailer.rs

use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct MailRelayConfig {
    pub url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Envio de e-mail por uma API HTTP de relay.
///
/// Sem configuração o envio fica desligado. Falhas de envio são só logadas:
/// o e-mail é um canal extra da notificação, que já foi gravada.
#[derive(Clone)]
pub struct Mailer {
    http: Client,
    config: Option<MailRelayConfig>,
}

impl Mailer {
    pub fn new(http: Client, config: Option<MailRelayConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("📭 MAIL_RELAY_URL não configurado: envio de e-mails desativado");
        }
        Self { http, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Retorna `true` quando o relay aceitou a mensagem.
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> bool {
        let Some(config) = &self.config else {
            tracing::debug!("E-mail para {} descartado (relay desativado)", to);
            return false;
        };

        let message = RelayMessage { from: &config.from, to, subject, text };

        let result = self
            .http
            .post(&config.url)
            .bearer_auth(&config.api_key)
            .json(&message)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("📧 E-mail '{}' enviado para {}", subject, to);
                true
            }
            Ok(resp) => {
                tracing::warn!("⚠️ Relay recusou e-mail para {}: HTTP {}", to, resp.status());
                false
            }
            Err(e) => {
                tracing::warn!("⚠️ Falha ao enviar e-mail para {}: {}", to, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn mailer(server: &MockServer) -> Mailer {
        Mailer::new(
            Client::new(),
            Some(MailRelayConfig {
                url: server.url("/send"),
                api_key: "chave".to_string(),
                from: "portal@empresa.com".to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn posts_message_to_relay() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/send")
                    .header("Authorization", "Bearer chave")
                    .json_body(json!({
                        "from": "portal@empresa.com",
                        "to": "ana@acme.com",
                        "subject": "Prazo",
                        "text": "Tarefa vence amanhã"
                    }));
                then.status(202);
            })
            .await;

        let sent = mailer(&server).send("ana@acme.com", "Prazo", "Tarefa vence amanhã").await;

        assert!(sent);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn relay_failure_does_not_propagate() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/send");
                then.status(500);
            })
            .await;

        assert!(!mailer(&server).send("ana@acme.com", "Prazo", "x").await);
    }

    #[tokio::test]
    async fn disabled_without_configuration() {
        let mailer = Mailer::new(Client::new(), None);
        assert!(!mailer.is_enabled());
        assert!(!mailer.send("ana@acme.com", "Prazo", "x").await);
    }
}
