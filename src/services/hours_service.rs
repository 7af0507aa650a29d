// src/services/hours_service.rs

use chrono::NaiveDate;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::HoursRepository,
    models::hours::{
        AccountingModel, CreateConsumptionPayload, CreatePackagePayload, HourBalance, HourConsumption,
        HourPackage, PackageType, UsageAlert,
    },
    services::tickets::parse::parse_duration_hours,
};

pub fn usage_alert(usage_percent: f64) -> UsageAlert {
    if usage_percent >= 100.0 {
        UsageAlert::Esgotado
    } else if usage_percent >= 80.0 {
        UsageAlert::Atencao
    } else {
        UsageAlert::Normal
    }
}

/// Pacote vigente: o "atual" mais recente.
fn current_package(packages: &[HourPackage]) -> Option<&HourPackage> {
    packages
        .iter()
        .filter(|p| p.is_current)
        .max_by_key(|p| (p.valid_from, p.created_at))
}

/// Consumo vinculado ao pacote, ou sem pacote e dentro da vigência dele.
fn counts_for_package(consumption: &HourConsumption, package: &HourPackage) -> bool {
    match consumption.package_id {
        Some(id) => id == package.id,
        None => {
            consumption.consumed_on >= package.valid_from
                && package.valid_until.is_none_or(|until| consumption.consumed_on <= until)
        }
    }
}

/// Saldo de horas da empresa conforme o modelo contábil do pacote vigente.
///
/// `standard` olha só o pacote vigente; `current_account` soma todos os
/// pacotes já iniciados e todo o consumo, podendo ficar negativo.
pub fn compute_balance(packages: &[HourPackage], consumptions: &[HourConsumption], today: NaiveDate) -> HourBalance {
    let Some(current) = current_package(packages) else {
        let consumed: f64 = consumptions.iter().map(|c| c.hours).sum();
        return HourBalance {
            accounting_model: None,
            current_package_id: None,
            hours_contracted: 0.0,
            hours_consumed: consumed,
            hours_remaining: -consumed,
            usage_percent: if consumed > 0.0 { 100.0 } else { 0.0 },
            alert: usage_alert(if consumed > 0.0 { 100.0 } else { 0.0 }),
        };
    };

    let (contracted, consumed) = match current.accounting_model {
        AccountingModel::Standard => {
            let consumed: f64 = consumptions
                .iter()
                .filter(|c| counts_for_package(c, current))
                .map(|c| c.hours)
                .sum();
            (current.hours_contracted, consumed)
        }
        AccountingModel::CurrentAccount => {
            let contracted: f64 = packages
                .iter()
                .filter(|p| p.valid_from <= today)
                .map(|p| p.hours_contracted)
                .sum();
            let consumed: f64 = consumptions.iter().map(|c| c.hours).sum();
            (contracted, consumed)
        }
    };

    let usage_percent = if contracted > 0.0 {
        ((consumed / contracted) * 1000.0).round() / 10.0
    } else if consumed > 0.0 {
        100.0
    } else {
        0.0
    };

    HourBalance {
        accounting_model: Some(current.accounting_model),
        current_package_id: Some(current.id),
        hours_contracted: contracted,
        hours_consumed: consumed,
        hours_remaining: contracted - consumed,
        usage_percent,
        alert: usage_alert(usage_percent),
    }
}

#[derive(Clone)]
pub struct HoursService {
    repo: HoursRepository,
}

impl HoursService {
    pub fn new(repo: HoursRepository) -> Self {
        Self { repo }
    }

    /// Cria o pacote. Pacote mensal substitui o atual na mesma transação.
    pub async fn create_package<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &CreatePackagePayload,
    ) -> Result<HourPackage, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        payload.validate()?;
        if matches!(payload.valid_until, Some(until) if until < payload.valid_from) {
            return Err(AppError::InvalidParameter("validUntil anterior a validFrom".to_string()));
        }

        let mut tx = executor.begin().await?;

        if payload.package_type == PackageType::Monthly {
            let replaced = self.repo.deactivate_current_monthly(&mut *tx, company_id).await?;
            if replaced > 0 {
                tracing::info!("🔁 Pacote mensal anterior da empresa {} desativado", company_id);
            }
        }

        let package = self.repo.create_package(&mut *tx, company_id, payload).await?;
        tx.commit().await?;

        tracing::info!(
            "📦 Pacote de {:.1}h ({:?}) criado para a empresa {}",
            package.hours_contracted,
            package.package_type,
            company_id
        );
        Ok(package)
    }

    pub async fn list_packages(&self, conn: &mut PgConnection, company_id: Uuid) -> Result<Vec<HourPackage>, AppError> {
        self.repo.list_packages(conn, company_id).await
    }

    pub async fn create_consumption(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        payload: &CreateConsumptionPayload,
        created_by: Uuid,
    ) -> Result<HourConsumption, AppError> {
        payload.validate()?;

        let hours = parse_duration_hours(&payload.hours)
            .filter(|h| *h > 0.0)
            .ok_or_else(|| AppError::InvalidParameter(format!("horas '{}'", payload.hours)))?;

        if let Some(package_id) = payload.package_id {
            let packages = self.repo.list_packages(&mut *conn, company_id).await?;
            if !packages.iter().any(|p| p.id == package_id) {
                return Err(AppError::ResourceNotFound("pacote de horas".to_string()));
            }
        }

        self.repo
            .create_consumption(
                &mut *conn,
                company_id,
                payload.package_id,
                payload.project_id,
                payload.task_id,
                hours,
                payload.consumed_on,
                payload.description.as_deref(),
                created_by,
            )
            .await
    }

    pub async fn list_consumptions(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<HourConsumption>, AppError> {
        self.repo.list_consumptions(conn, company_id, from, until).await
    }

    pub async fn balance(&self, conn: &mut PgConnection, company_id: Uuid, today: NaiveDate) -> Result<HourBalance, AppError> {
        let packages = self.repo.list_packages(&mut *conn, company_id).await?;
        let consumptions = self.repo.list_consumptions(&mut *conn, company_id, None, None).await?;

        let balance = compute_balance(&packages, &consumptions, today);
        if balance.alert != UsageAlert::Normal {
            tracing::warn!(
                "⚠️ Empresa {} com {:.1}% das horas consumidas",
                company_id,
                balance.usage_percent
            );
        }
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn package(model: AccountingModel, hours: f64, from: NaiveDate, current: bool) -> HourPackage {
        HourPackage {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            package_type: PackageType::Monthly,
            accounting_model: model,
            hours_contracted: hours,
            valid_from: from,
            valid_until: None,
            is_current: current,
            created_at: Utc::now(),
        }
    }

    fn consumption(package: &HourPackage, hours: f64) -> HourConsumption {
        HourConsumption {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            package_id: Some(package.id),
            project_id: None,
            task_id: None,
            hours,
            consumed_on: package.valid_from,
            description: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn alert_thresholds() {
        assert_eq!(usage_alert(79.9), UsageAlert::Normal);
        assert_eq!(usage_alert(80.0), UsageAlert::Atencao);
        assert_eq!(usage_alert(99.9), UsageAlert::Atencao);
        assert_eq!(usage_alert(100.0), UsageAlert::Esgotado);
        assert_eq!(usage_alert(130.0), UsageAlert::Esgotado);
    }

    #[test]
    fn standard_balance_uses_only_the_current_package() {
        let old = package(AccountingModel::Standard, 20.0, d(2025, 1, 1), false);
        let current = package(AccountingModel::Standard, 40.0, d(2025, 2, 1), true);
        let consumptions = vec![consumption(&old, 15.0), consumption(&current, 34.0)];

        let balance = compute_balance(&[old, current.clone()], &consumptions, d(2025, 2, 20));

        assert_eq!(balance.current_package_id, Some(current.id));
        assert_eq!(balance.hours_contracted, 40.0);
        assert_eq!(balance.hours_consumed, 34.0);
        assert_eq!(balance.hours_remaining, 6.0);
        assert_eq!(balance.usage_percent, 85.0);
        assert_eq!(balance.alert, UsageAlert::Atencao);
    }

    #[test]
    fn current_account_rolls_over_and_may_go_negative() {
        let jan = package(AccountingModel::CurrentAccount, 10.0, d(2025, 1, 1), false);
        let feb = package(AccountingModel::CurrentAccount, 10.0, d(2025, 2, 1), true);
        let future = package(AccountingModel::CurrentAccount, 10.0, d(2025, 4, 1), false);
        let consumptions = vec![consumption(&jan, 4.0), consumption(&feb, 19.0)];

        let balance = compute_balance(&[jan, feb, future], &consumptions, d(2025, 2, 20));

        assert_eq!(balance.hours_contracted, 20.0);
        assert_eq!(balance.hours_consumed, 23.0);
        assert_eq!(balance.hours_remaining, -3.0);
        assert_eq!(balance.usage_percent, 115.0);
        assert_eq!(balance.alert, UsageAlert::Esgotado);
    }

    #[test]
    fn standard_balance_counts_untagged_consumption_within_validity() {
        let mut current = package(AccountingModel::Standard, 10.0, d(2025, 2, 1), true);
        current.valid_until = Some(d(2025, 2, 28));

        let mut inside = consumption(&current, 9.0);
        inside.package_id = None;
        inside.consumed_on = d(2025, 2, 10);
        let mut before = consumption(&current, 5.0);
        before.package_id = None;
        before.consumed_on = d(2025, 1, 31);
        let mut after = consumption(&current, 3.0);
        after.package_id = None;
        after.consumed_on = d(2025, 3, 1);

        let balance = compute_balance(&[current], &[inside, before, after], d(2025, 2, 20));

        assert_eq!(balance.hours_consumed, 9.0);
        assert_eq!(balance.hours_remaining, 1.0);
        assert_eq!(balance.usage_percent, 90.0);
        assert_eq!(balance.alert, UsageAlert::Atencao);
    }

    #[test]
    fn no_package_means_empty_balance() {
        let balance = compute_balance(&[], &[], d(2025, 2, 20));
        assert_eq!(balance.accounting_model, None);
        assert_eq!(balance.hours_remaining, 0.0);
        assert_eq!(balance.alert, UsageAlert::Normal);
    }
}
