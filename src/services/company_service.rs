// src/services/company_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::CompanyRepository,
    models::company::{BillingSnapshot, Company, CreateCompanyPayload, UpdateBillingPayload, UpdateCompanyPayload},
};

fn luhn_valid(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn card_brand(number: &str) -> &'static str {
    let prefix = |len: usize| -> u32 { number.get(..len).and_then(|p| p.parse().ok()).unwrap_or(0) };

    const ELO: &[&str] = &[
        "401178", "401179", "431274", "438935", "451416", "457393", "457631", "457632", "504175", "506699",
        "5067", "509", "627780", "636297", "636368", "650", "6516", "6550",
    ];

    if ELO.iter().any(|p| number.starts_with(p)) {
        "elo"
    } else if number.starts_with("606282") || number.starts_with("3841") {
        "hipercard"
    } else if matches!(prefix(2), 34 | 37) {
        "amex"
    } else if matches!(prefix(2), 36 | 38) || (300..=305).contains(&prefix(3)) {
        "diners"
    } else if number.starts_with('4') {
        "visa"
    } else if (51..=55).contains(&prefix(2)) || (2221..=2720).contains(&prefix(4)) {
        "mastercard"
    } else if number.starts_with("6011") || number.starts_with("65") {
        "discover"
    } else {
        "desconhecida"
    }
}

/// Reduz o número do cartão a bandeira + últimos 4 dígitos.
///
/// O número completo nunca sai desta função.
pub fn mask_card(raw: &str) -> Result<BillingSnapshot, AppError> {
    let number: String = raw.chars().filter(|c| !matches!(c, ' ' | '-' | '.')).collect();

    let digits: Option<Vec<u32>> = number.chars().map(|c| c.to_digit(10)).collect();
    let digits = digits.ok_or_else(|| AppError::InvalidParameter("número do cartão".to_string()))?;

    if !(12..=19).contains(&digits.len()) || !luhn_valid(&digits) {
        return Err(AppError::InvalidParameter("número do cartão".to_string()));
    }

    Ok(BillingSnapshot {
        card_brand: card_brand(&number).to_string(),
        card_last4: number[number.len() - 4..].to_string(),
    })
}

#[derive(Clone)]
pub struct CompanyService {
    repo: CompanyRepository,
}

impl CompanyService {
    pub fn new(repo: CompanyRepository) -> Self {
        Self { repo }
    }

    pub async fn create_company<'e, E>(&self, executor: E, payload: &CreateCompanyPayload) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        payload.validate()?;
        let company = self.repo.create_company(executor, payload).await?;
        tracing::info!("🏢 Empresa '{}' criada ({})", company.name, company.id);
        Ok(company)
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        self.repo.list_companies().await
    }

    pub async fn get_company<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, company_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("empresa".to_string()))
    }

    pub async fn update_company<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &UpdateCompanyPayload,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        payload.validate()?;
        self.repo
            .update_company(executor, company_id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("empresa".to_string()))
    }

    pub async fn update_billing<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &UpdateBillingPayload,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        payload.validate()?;
        let snapshot = mask_card(&payload.card_number)?;

        let company = self
            .repo
            .update_billing(
                executor,
                company_id,
                &snapshot,
                payload.card_holder.trim(),
                payload.billing_email.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("empresa".to_string()))?;

        tracing::info!(
            "💳 Cobrança da empresa {} atualizada ({} final {})",
            company_id,
            snapshot.card_brand,
            snapshot.card_last4
        );
        Ok(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_is_reduced_to_brand_and_last_four() {
        let visa = mask_card("4242 4242 4242 4242").unwrap();
        assert_eq!(visa.card_brand, "visa");
        assert_eq!(visa.card_last4, "4242");

        let master = mask_card("5555-5555-5555-4444").unwrap();
        assert_eq!(master.card_brand, "mastercard");
        assert_eq!(master.card_last4, "4444");

        let amex = mask_card("378282246310005").unwrap();
        assert_eq!(amex.card_brand, "amex");
        assert_eq!(amex.card_last4, "0005");
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        // Falha no dígito verificador
        assert!(mask_card("4242 4242 4242 4241").is_err());
        assert!(mask_card("4242 abcd 4242 4242").is_err());
        assert!(mask_card("4242").is_err());
    }

    #[test]
    fn snapshot_never_contains_the_full_number() {
        let snapshot = mask_card("4111111111111111").unwrap();
        let debug = format!("{:?}", snapshot);
        assert!(!debug.contains("4111111111111111"));
    }
}
