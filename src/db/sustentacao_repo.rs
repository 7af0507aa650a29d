// src/db/sustentacao_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sustentacao::{SaldoMensal, SustentacaoEmpresaConfig, UpsertSustentacaoConfigPayload},
};

#[derive(Clone)]
pub struct SustentacaoRepository {
    pool: PgPool,
}

impl SustentacaoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CONFIGURAÇÃO DO CONTRATO
    // =========================================================================

    pub async fn get_config<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Option<SustentacaoEmpresaConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = sqlx::query_as::<_, SustentacaoEmpresaConfig>(
            "SELECT * FROM sustentacao_empresa_config WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(executor)
        .await?;

        Ok(config)
    }

    /// Todas as configurações (console do super admin).
    pub async fn list_configs(&self) -> Result<Vec<SustentacaoEmpresaConfig>, AppError> {
        let configs = sqlx::query_as::<_, SustentacaoEmpresaConfig>(
            "SELECT * FROM sustentacao_empresa_config ORDER BY data_inicio DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(configs)
    }

    // UPSERT (Insert or Update): uma configuração por empresa
    pub async fn upsert_config<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        input: &UpsertSustentacaoConfigPayload,
    ) -> Result<SustentacaoEmpresaConfig, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = sqlx::query_as::<_, SustentacaoEmpresaConfig>(
            r#"
            INSERT INTO sustentacao_empresa_config (
                company_id, horas_contratadas, data_inicio, data_fim, saldo_negativo,
                fonte, planilha_id, planilha_intervalo, nome_empresa_fonte, ativo
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (company_id)
            DO UPDATE SET
                horas_contratadas = EXCLUDED.horas_contratadas,
                data_inicio = EXCLUDED.data_inicio,
                data_fim = EXCLUDED.data_fim,
                saldo_negativo = EXCLUDED.saldo_negativo,
                fonte = EXCLUDED.fonte,
                planilha_id = EXCLUDED.planilha_id,
                planilha_intervalo = EXCLUDED.planilha_intervalo,
                nome_empresa_fonte = EXCLUDED.nome_empresa_fonte,
                ativo = EXCLUDED.ativo,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.horas_contratadas)
        .bind(input.data_inicio)
        .bind(input.data_fim)
        .bind(input.saldo_negativo)
        .bind(input.fonte)
        .bind(&input.planilha_id)
        .bind(&input.planilha_intervalo)
        .bind(&input.nome_empresa_fonte)
        .bind(input.ativo)
        .fetch_one(executor)
        .await?;

        Ok(config)
    }

    pub async fn delete_config<'e, E>(&self, executor: E, company_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sustentacao_empresa_config WHERE company_id = $1")
            .bind(company_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  SALDOS MENSAIS (meses fechados)
    // =========================================================================

    pub async fn list_saldos<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<SaldoMensal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saldos = sqlx::query_as::<_, SaldoMensal>(
            r#"
            SELECT * FROM saldos_mensais
            WHERE company_id = $1 AND mes BETWEEN $2 AND $3
            ORDER BY mes ASC
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(until)
        .fetch_all(executor)
        .await?;

        Ok(saldos)
    }

    pub async fn upsert_saldo<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        mes: NaiveDate,
        horas_contratadas: f64,
        horas_consumidas: f64,
        saldo: f64,
        saldo_acumulado: f64,
        fechado_por: Uuid,
    ) -> Result<SaldoMensal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saldo = sqlx::query_as::<_, SaldoMensal>(
            r#"
            INSERT INTO saldos_mensais (
                company_id, mes, horas_contratadas, horas_consumidas,
                saldo, saldo_acumulado, fechado_por
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (company_id, mes)
            DO UPDATE SET
                horas_contratadas = EXCLUDED.horas_contratadas,
                horas_consumidas = EXCLUDED.horas_consumidas,
                saldo = EXCLUDED.saldo,
                saldo_acumulado = EXCLUDED.saldo_acumulado,
                fechado_por = EXCLUDED.fechado_por,
                fechado_em = NOW()
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(mes)
        .bind(horas_contratadas)
        .bind(horas_consumidas)
        .bind(saldo)
        .bind(saldo_acumulado)
        .bind(fechado_por)
        .fetch_one(executor)
        .await?;

        Ok(saldo)
    }
}
