// src/services/tickets.rs

pub mod oauth_api;
pub mod parse;
pub mod planilha;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    models::sustentacao::{FonteTickets, SustentacaoEmpresaConfig, Ticket},
};

use self::parse::{TicketColumn, canonical_column, normalize_header, parse_duration_hours, parse_ticket_date};

/// Fonte externa de chamados de sustentação.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Tickets da empresa configurada com data em `[from, until]`.
    async fn fetch_tickets(
        &self,
        config: &SustentacaoEmpresaConfig,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Ticket>, AppError>;
}

/// Escolhe a fonte conforme `config.fonte`.
#[derive(Clone, Default)]
pub struct TicketSources {
    pub planilha: Option<Arc<dyn TicketSource>>,
    pub api: Option<Arc<dyn TicketSource>>,
}

impl TicketSources {
    pub fn new(planilha: Option<Arc<dyn TicketSource>>, api: Option<Arc<dyn TicketSource>>) -> Self {
        Self { planilha, api }
    }

    pub async fn fetch_tickets(
        &self,
        config: &SustentacaoEmpresaConfig,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Ticket>, AppError> {
        let source = match config.fonte {
            FonteTickets::Planilha => self.planilha.as_ref(),
            FonteTickets::Api => self.api.as_ref(),
        };

        let Some(source) = source else {
            return Err(AppError::TicketSource(format!(
                "fonte de tickets '{:?}' não configurada no servidor",
                config.fonte
            )));
        };

        source.fetch_tickets(config, from, until).await
    }
}

/// Compara nomes de empresa ignorando acentos, caixa e pontuação.
pub fn same_company(a: &str, b: &str) -> bool {
    let left = normalize_header(a);
    !left.is_empty() && left == normalize_header(b)
}

/// Converte linhas tabulares (primeira linha = cabeçalho) em tickets da empresa.
///
/// Linhas sem data válida são descartadas; horas ilegíveis contam como zero.
pub fn rows_to_tickets(
    rows: &[Vec<String>],
    empresa: &str,
    from: NaiveDate,
    until: NaiveDate,
) -> Vec<Ticket> {
    let Some((header, body)) = rows.split_first() else {
        return Vec::new();
    };

    let mut columns: HashMap<TicketColumn, usize> = HashMap::new();
    for (idx, raw) in header.iter().enumerate() {
        if let Some(column) = canonical_column(&normalize_header(raw)) {
            // Primeira ocorrência vence
            columns.entry(column).or_insert(idx);
        }
    }

    if !columns.contains_key(&TicketColumn::Data) {
        tracing::warn!("⚠️ Fonte de tickets sem coluna de data reconhecível: {:?}", header);
        return Vec::new();
    }

    let cell = |row: &Vec<String>, column: TicketColumn| -> Option<String> {
        columns
            .get(&column)
            .and_then(|idx| row.get(*idx))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let mut tickets = Vec::new();
    for (offset, row) in body.iter().enumerate() {
        // Linha 1 é o cabeçalho
        let line = offset + 2;

        if row.iter().all(|value| value.trim().is_empty()) {
            continue;
        }

        let row_empresa = cell(row, TicketColumn::Empresa).unwrap_or_default();
        if columns.contains_key(&TicketColumn::Empresa) && !same_company(&row_empresa, empresa) {
            continue;
        }

        let Some(data) = cell(row, TicketColumn::Data).as_deref().and_then(parse_ticket_date) else {
            tracing::warn!("⚠️ Linha {} ignorada: data ausente ou inválida", line);
            continue;
        };
        if data < from || data > until {
            continue;
        }

        let horas = match cell(row, TicketColumn::Horas) {
            Some(raw) => parse_duration_hours(&raw).unwrap_or_else(|| {
                tracing::warn!("⚠️ Linha {}: duração '{}' ilegível, contando 0h", line, raw);
                0.0
            }),
            None => 0.0,
        };

        tickets.push(Ticket {
            id: cell(row, TicketColumn::Id).unwrap_or_else(|| format!("linha-{}", line)),
            empresa: if row_empresa.is_empty() { empresa.to_string() } else { row_empresa },
            titulo: cell(row, TicketColumn::Titulo),
            status: cell(row, TicketColumn::Status),
            responsavel: cell(row, TicketColumn::Responsavel),
            data,
            horas,
        });
    }

    tickets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rows_are_mapped_filtered_and_parsed() {
        let rows = vec![
            row(&["Nº Chamado", "Cliente", "Assunto", "Data de Abertura", "Tempo Gasto"]),
            row(&["101", "ACME Ltda", "Erro no login", "03/02/2025", "02:30"]),
            row(&["102", "Outra SA", "Relatório", "04/02/2025", "1,0"]),
            row(&["103", "acme ltda", "Backup", "2025-02-10", "xyz"]),
            row(&["104", "ACME Ltda", "Sem data", "", "1"]),
            row(&["105", "ACME Ltda", "Fora do período", "15/03/2025", "4"]),
            row(&["", "", "", "", ""]),
        ];

        let tickets = rows_to_tickets(&rows, "ACME LTDA", date(2025, 2, 1), date(2025, 2, 28));

        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].id, "101");
        assert_eq!(tickets[0].horas, 2.5);
        assert_eq!(tickets[0].titulo.as_deref(), Some("Erro no login"));
        assert_eq!(tickets[1].id, "103");
        assert_eq!(tickets[1].horas, 0.0);
        assert_eq!(tickets[1].data, date(2025, 2, 10));
    }

    #[test]
    fn missing_id_uses_line_number() {
        let rows = vec![
            row(&["empresa", "data", "horas"]),
            row(&["ACME", "05/02/2025", "1.5"]),
        ];

        let tickets = rows_to_tickets(&rows, "ACME", date(2025, 2, 1), date(2025, 2, 28));

        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, "linha-2");
        assert_eq!(tickets[0].horas, 1.5);
    }

    #[test]
    fn without_date_column_nothing_is_returned() {
        let rows = vec![row(&["empresa", "horas"]), row(&["ACME", "1"])];
        assert!(rows_to_tickets(&rows, "ACME", date(2025, 1, 1), date(2025, 12, 31)).is_empty());
    }

    #[test]
    fn company_names_compare_loosely() {
        assert!(same_company("Açaí & Cia.", "acai cia"));
        assert!(!same_company("", ""));
        assert!(!same_company("ACME", "ACME2"));
    }
}
