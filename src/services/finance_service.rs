// src/services/finance_service.rs

use std::path::PathBuf;

use chrono::NaiveDate;
use genpdf::{Element, elements, style};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, FinanceRepository},
    models::finance::{CreateEntryPayload, DreReport, EntryKind, FinancialEntry, UpdateEntryPayload},
};

/// Agrega os lançamentos do período no DRE.
pub fn compute_dre(entries: &[FinancialEntry], period_start: NaiveDate, period_end: NaiveDate) -> DreReport {
    let total = |kind: EntryKind| -> Decimal {
        entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.amount)
            .sum()
    };

    let receita_bruta = total(EntryKind::ReceitaBruta);
    let deducoes = total(EntryKind::Deducao);
    let receita_liquida = receita_bruta - deducoes;

    let custos = total(EntryKind::Custo);
    let lucro_bruto = receita_liquida - custos;

    let despesas_operacionais = total(EntryKind::DespesaOperacional);
    let resultado_operacional = lucro_bruto - despesas_operacionais;

    let receitas_financeiras = total(EntryKind::ReceitaFinanceira);
    let despesas_financeiras = total(EntryKind::DespesaFinanceira);
    let resultado_antes_impostos = resultado_operacional + receitas_financeiras - despesas_financeiras;

    let impostos = total(EntryKind::Imposto);
    let lucro_liquido = resultado_antes_impostos - impostos;

    let margem_liquida = if receita_liquida.is_zero() {
        Decimal::ZERO
    } else {
        (lucro_liquido / receita_liquida * Decimal::ONE_HUNDRED).round_dp(2)
    };

    DreReport {
        period_start,
        period_end,
        receita_bruta,
        deducoes,
        receita_liquida,
        custos,
        lucro_bruto,
        despesas_operacionais,
        resultado_operacional,
        receitas_financeiras,
        despesas_financeiras,
        resultado_antes_impostos,
        impostos,
        lucro_liquido,
        margem_liquida,
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidParameter("amount deve ser maior que zero".to_string()));
    }
    Ok(())
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

#[derive(Clone)]
pub struct FinanceService {
    repo: FinanceRepository,
    company_repo: CompanyRepository,
    fonts_dir: PathBuf,
}

impl FinanceService {
    pub fn new(repo: FinanceRepository, company_repo: CompanyRepository, fonts_dir: PathBuf) -> Self {
        Self { repo, company_repo, fonts_dir }
    }

    pub async fn create_entry(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        payload: &CreateEntryPayload,
        created_by: Uuid,
    ) -> Result<FinancialEntry, AppError> {
        payload.validate()?;
        ensure_positive(payload.amount)?;

        self.repo.create_entry(conn, company_id, payload, created_by).await
    }

    pub async fn list_entries(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
        kind: Option<EntryKind>,
    ) -> Result<Vec<FinancialEntry>, AppError> {
        if from > until {
            return Err(AppError::InvalidParameter("from posterior a to".to_string()));
        }
        self.repo.list_entries(conn, company_id, from, until, kind).await
    }

    pub async fn update_entry(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        entry_id: Uuid,
        payload: &UpdateEntryPayload,
    ) -> Result<FinancialEntry, AppError> {
        payload.validate()?;
        if let Some(amount) = payload.amount {
            ensure_positive(amount)?;
        }

        self.repo
            .update_entry(conn, company_id, entry_id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("lançamento".to_string()))
    }

    pub async fn delete_entry(&self, conn: &mut PgConnection, company_id: Uuid, entry_id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete_entry(conn, company_id, entry_id).await? {
            return Err(AppError::ResourceNotFound("lançamento".to_string()));
        }
        Ok(())
    }

    pub async fn dre(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<DreReport, AppError> {
        let entries = self.list_entries(conn, company_id, from, until, None).await?;
        Ok(compute_dre(&entries, from, until))
    }

    /// DRE do período renderizado em PDF (fontes em `PDF_FONTS_DIR`).
    pub async fn dre_pdf(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<u8>, AppError> {
        let report = self.dre(&mut *conn, company_id, from, until).await?;
        let company_name = self
            .company_repo
            .find_by_id(&mut *conn, company_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_else(|| "Empresa".to_string());

        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte Roboto não encontrada em {}", self.fonts_dir.display()))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("DRE {} - {}", company_name, report.period_start.format("%m/%Y")));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(elements::Paragraph::new(company_name).styled(style::Style::new().bold().with_font_size(18)));
        doc.push(
            elements::Paragraph::new("DEMONSTRATIVO DE RESULTADOS DO EXERCÍCIO")
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Período: {} a {}",
            report.period_start.format("%d/%m/%Y"),
            report.period_end.format("%d/%m/%Y")
        )));
        doc.push(elements::Break::new(2));

        let bold = style::Style::new().bold();
        // (rótulo, valor, linha de resultado?)
        let lines: [(&str, Decimal, bool); 13] = [
            ("Receita bruta", report.receita_bruta, false),
            ("(-) Deduções", report.deducoes, false),
            ("= Receita líquida", report.receita_liquida, true),
            ("(-) Custos", report.custos, false),
            ("= Lucro bruto", report.lucro_bruto, true),
            ("(-) Despesas operacionais", report.despesas_operacionais, false),
            ("= Resultado operacional", report.resultado_operacional, true),
            ("(+) Receitas financeiras", report.receitas_financeiras, false),
            ("(-) Despesas financeiras", report.despesas_financeiras, false),
            ("= Resultado antes dos impostos", report.resultado_antes_impostos, true),
            ("(-) Impostos", report.impostos, false),
            ("= Lucro líquido", report.lucro_liquido, true),
            ("Margem líquida (%)", report.margem_liquida, true),
        ];

        let mut table = elements::TableLayout::new(vec![4, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        for (label, value, highlight) in lines {
            let style = if highlight { bold } else { style::Style::new() };
            let mut amount = elements::Paragraph::new(format!("{:.2}", value));
            amount.set_alignment(genpdf::Alignment::Right);

            table
                .row()
                .element(elements::Paragraph::new(label).styled(style))
                .element(amount.styled(style))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;

        tracing::info!("🧾 DRE em PDF gerado para a empresa {} ({} bytes)", company_id, buffer.len());
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(kind: EntryKind, amount: Decimal) -> FinancialEntry {
        FinancialEntry {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            project_id: None,
            kind,
            description: "x".to_string(),
            amount,
            competence_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn dre_cascades_through_each_result_line() {
        let entries = vec![
            entry(EntryKind::ReceitaBruta, Decimal::from(10000)),
            entry(EntryKind::ReceitaBruta, Decimal::from(2000)),
            entry(EntryKind::Deducao, Decimal::from(1000)),
            entry(EntryKind::Custo, Decimal::from(4000)),
            entry(EntryKind::DespesaOperacional, Decimal::from(2500)),
            entry(EntryKind::ReceitaFinanceira, Decimal::from(300)),
            entry(EntryKind::DespesaFinanceira, Decimal::from(800)),
            entry(EntryKind::Imposto, Decimal::from(600)),
        ];
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

        let dre = compute_dre(&entries, start, end);

        assert_eq!(dre.receita_bruta, Decimal::from(12000));
        assert_eq!(dre.receita_liquida, Decimal::from(11000));
        assert_eq!(dre.lucro_bruto, Decimal::from(7000));
        assert_eq!(dre.resultado_operacional, Decimal::from(4500));
        assert_eq!(dre.resultado_antes_impostos, Decimal::from(4000));
        assert_eq!(dre.lucro_liquido, Decimal::from(3400));
        assert_eq!(dre.margem_liquida, Decimal::new(3091, 2));
    }

    #[test]
    fn margin_is_zero_without_revenue() {
        let entries = vec![entry(EntryKind::Custo, Decimal::from(500))];
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let dre = compute_dre(&entries, day, day);

        assert_eq!(dre.lucro_liquido, Decimal::from(-500));
        assert_eq!(dre.margem_liquida, Decimal::ZERO);
    }
}
