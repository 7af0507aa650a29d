// src/services/tickets/parse.rs

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Colunas reconhecidas na fonte de tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketColumn {
    Id,
    Empresa,
    Titulo,
    Status,
    Responsavel,
    Data,
    Horas,
}

/// "Data de Abertura " -> "data_de_abertura"
pub fn normalize_header(raw: &str) -> String {
    let ascii = deunicode::deunicode(raw.trim()).to_lowercase();

    let mut normalized = String::with_capacity(ascii.len());
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            normalized.push(ch);
        } else if !normalized.ends_with('_') {
            normalized.push('_');
        }
    }
    normalized.trim_matches('_').to_string()
}

/// Mapeia um cabeçalho já normalizado para a coluna canônica.
pub fn canonical_column(normalized: &str) -> Option<TicketColumn> {
    let column = match normalized {
        "id" | "ticket" | "chamado" | "n_chamado" | "no_chamado" | "numero" | "numero_chamado" | "id_chamado"
        | "ticket_id" | "protocolo" => TicketColumn::Id,
        "empresa" | "cliente" | "company" | "organizacao" | "nome_empresa" => TicketColumn::Empresa,
        "titulo" | "assunto" | "resumo" | "descricao" | "title" | "subject" => TicketColumn::Titulo,
        "status" | "situacao" | "estado" => TicketColumn::Status,
        "responsavel" | "analista" | "atendente" | "consultor" | "assignee" => TicketColumn::Responsavel,
        "data" | "data_abertura" | "data_de_abertura" | "abertura" | "data_atendimento"
        | "data_chamado" | "date" | "created_at" => TicketColumn::Data,
        "horas" | "tempo" | "duracao" | "tempo_gasto" | "horas_gastas" | "tempo_total"
        | "horas_consumidas" | "hours" | "time_spent" => TicketColumn::Horas,
        _ => return None,
    };
    Some(column)
}

/// Texto de uma célula JSON (planilhas devolvem números sem aspas).
pub fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Converte "HH:MM", "HH:MM:SS" ou decimal ("2.5" / "2,5") em horas decimais.
pub fn parse_duration_hours(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if value.contains(':') {
        let parts: Vec<&str> = value.split(':').map(str::trim).collect();
        if parts.len() < 2 || parts.len() > 3 {
            return None;
        }
        let hours: u32 = parts[0].parse().ok()?;
        let minutes: u32 = parts[1].parse().ok()?;
        let seconds: u32 = match parts.get(2) {
            Some(s) => s.parse().ok()?,
            None => 0,
        };
        if minutes >= 60 || seconds >= 60 {
            return None;
        }
        return Some(hours as f64 + minutes as f64 / 60.0 + seconds as f64 / 3600.0);
    }

    let decimal: f64 = value.replace(',', ".").parse().ok()?;
    if decimal.is_finite() && decimal >= 0.0 {
        Some(decimal)
    } else {
        None
    }
}

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%y"];
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Datas no formato brasileiro, ISO, RFC 3339 ou número serial de planilha.
pub fn parse_ticket_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    // Planilhas exportadas sem formatação trazem dias desde 30/12/1899
    if let Ok(serial) = value.replace(',', ".").parse::<f64>() {
        if (20_000.0..100_000.0).contains(&serial) {
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            return epoch.checked_add_signed(Duration::days(serial.trunc() as i64));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_accepts_clock_and_decimal_forms() {
        assert_eq!(parse_duration_hours("02:30"), Some(2.5));
        assert_eq!(parse_duration_hours("2:30"), Some(2.5));
        assert_eq!(parse_duration_hours("01:15:00"), Some(1.25));
        assert_eq!(parse_duration_hours("2.5"), Some(2.5));
        assert_eq!(parse_duration_hours("1,5"), Some(1.5));
        assert_eq!(parse_duration_hours(" 3 "), Some(3.0));
        assert_eq!(parse_duration_hours("00:00"), Some(0.0));
    }

    #[test]
    fn duration_rejects_garbage() {
        assert_eq!(parse_duration_hours(""), None);
        assert_eq!(parse_duration_hours("abc"), None);
        assert_eq!(parse_duration_hours("01:75"), None);
        assert_eq!(parse_duration_hours("-2"), None);
        assert_eq!(parse_duration_hours("1:2:3:4"), None);
    }

    #[test]
    fn dates_in_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_ticket_date("14/03/2025"), Some(expected));
        assert_eq!(parse_ticket_date("14/03/2025 09:41"), Some(expected));
        assert_eq!(parse_ticket_date("2025-03-14"), Some(expected));
        assert_eq!(parse_ticket_date("2025-03-14T18:00:00-03:00"), Some(expected));
        assert_eq!(parse_ticket_date("45730"), Some(expected));
        assert_eq!(parse_ticket_date("amanhã"), None);
    }

    #[test]
    fn headers_are_normalized_and_aliased() {
        assert_eq!(normalize_header("  Data de Abertura "), "data_de_abertura");
        assert_eq!(normalize_header("Nº Chamado"), "no_chamado");
        assert_eq!(normalize_header("Responsável"), "responsavel");
        assert_eq!(normalize_header("Tempo (gasto)"), "tempo_gasto");

        assert_eq!(canonical_column("data_de_abertura"), Some(TicketColumn::Data));
        assert_eq!(canonical_column("responsavel"), Some(TicketColumn::Responsavel));
        assert_eq!(canonical_column("tempo_gasto"), Some(TicketColumn::Horas));
        assert_eq!(canonical_column("cliente"), Some(TicketColumn::Empresa));
        assert_eq!(canonical_column("observacoes"), None);
    }
}
