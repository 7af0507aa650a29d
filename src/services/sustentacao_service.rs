// src/services/sustentacao_service.rs

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        dates::{month_end, month_start, months_between},
        error::AppError,
        pagination::{Page, PageParams},
    },
    db::SustentacaoRepository,
    models::sustentacao::{
        FonteTickets, OrigemSaldo, SaldoMensal, SaldoMes, SaldoSustentacao, SustentacaoEmpresaConfig,
        Ticket, UpsertSustentacaoConfigPayload,
    },
    services::tickets::TicketSources,
};

/// Parâmetros do contrato que entram no cálculo de saldo.
#[derive(Debug, Clone, Copy)]
pub struct Contrato {
    pub horas_contratadas: f64,
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    pub saldo_negativo: bool,
}

impl From<&SustentacaoEmpresaConfig> for Contrato {
    fn from(config: &SustentacaoEmpresaConfig) -> Self {
        Self {
            horas_contratadas: config.horas_contratadas,
            data_inicio: config.data_inicio,
            data_fim: config.data_fim,
            saldo_negativo: config.saldo_negativo,
        }
    }
}

/// Saldo de horas de sustentação para `mes_alvo`.
///
/// Percorre os meses do início do contrato até o mês anterior ao alvo,
/// ignorando os que caem fora da vigência. Meses fechados usam a fotografia
/// gravada; os demais usam `consumo_por_mes` (chave = dia 1 do mês).
pub fn calcular_saldo(
    contrato: &Contrato,
    consumo_por_mes: &BTreeMap<NaiveDate, f64>,
    fechados: &HashMap<NaiveDate, SaldoMensal>,
    mes_alvo: NaiveDate,
) -> SaldoSustentacao {
    let alvo = month_start(mes_alvo);
    let inicio = month_start(contrato.data_inicio);
    let fim = month_start(contrato.data_fim);

    let mut saldo_acumulado = 0.0;
    let mut historico = Vec::new();

    if inicio < alvo {
        let anterior = alvo.pred_opt().unwrap_or(alvo);
        for mes in months_between(inicio, anterior) {
            if mes < inicio || mes > fim {
                continue;
            }

            let (contratadas, consumidas, mut saldo, origem) = match fechados.get(&mes) {
                Some(fechado) => (
                    fechado.horas_contratadas,
                    fechado.horas_consumidas,
                    fechado.saldo,
                    OrigemSaldo::Fechado,
                ),
                None => {
                    let consumidas = consumo_por_mes.get(&mes).copied().unwrap_or(0.0);
                    (
                        contrato.horas_contratadas,
                        consumidas,
                        contrato.horas_contratadas - consumidas,
                        OrigemSaldo::Calculado,
                    )
                }
            };

            if !contrato.saldo_negativo && saldo < 0.0 {
                saldo = 0.0;
            }
            saldo_acumulado += saldo;

            historico.push(SaldoMes {
                mes,
                horas_contratadas: contratadas,
                horas_consumidas: consumidas,
                saldo,
                saldo_acumulado,
                origem,
            });
        }
    }

    let saldo_final_proximo_mes = contrato.horas_contratadas + saldo_acumulado;
    let horas_consumidas_mes = match fechados.get(&alvo) {
        Some(fechado) => fechado.horas_consumidas,
        None => consumo_por_mes.get(&alvo).copied().unwrap_or(0.0),
    };

    SaldoSustentacao {
        mes_referencia: alvo,
        horas_contratadas: contrato.horas_contratadas,
        saldo_negativo: contrato.saldo_negativo,
        dentro_da_vigencia: inicio <= alvo && alvo <= fim,
        saldo_acumulado,
        saldo_final_proximo_mes,
        horas_disponiveis_mes: saldo_final_proximo_mes,
        horas_consumidas_mes,
        saldo_mes_atual: saldo_final_proximo_mes - horas_consumidas_mes,
        historico,
    }
}

/// Janela da busca única de tickets para o saldo de `alvo`.
///
/// Começa no primeiro mês ainda não fechado e vai até o fim do mês alvo.
/// `None` quando todos os meses até o alvo já estão fechados.
pub fn janela_de_busca(
    data_inicio: NaiveDate,
    alvo: NaiveDate,
    fechados: &HashMap<NaiveDate, SaldoMensal>,
) -> Option<(NaiveDate, NaiveDate)> {
    let alvo = month_start(alvo);
    let inicio = month_start(data_inicio).min(alvo);

    months_between(inicio, alvo)
        .into_iter()
        .find(|mes| !fechados.contains_key(mes))
        .map(|primeiro_aberto| (primeiro_aberto, month_end(alvo)))
}

/// Saldo do mês que está sendo fechado e o acumulado até ele, inclusive.
pub fn saldo_de_fechamento(contrato: &Contrato, consumidas: f64, acumulado_anterior: f64) -> (f64, f64) {
    let mut saldo = contrato.horas_contratadas - consumidas;
    if !contrato.saldo_negativo && saldo < 0.0 {
        saldo = 0.0;
    }
    (saldo, acumulado_anterior + saldo)
}

/// Soma as horas dos tickets por mês (chave = dia 1).
pub fn consumo_por_mes(tickets: &[Ticket]) -> BTreeMap<NaiveDate, f64> {
    let mut consumo = BTreeMap::new();
    for ticket in tickets {
        *consumo.entry(month_start(ticket.data)).or_insert(0.0) += ticket.horas;
    }
    consumo
}

#[derive(Clone)]
pub struct SustentacaoService {
    repo: SustentacaoRepository,
    sources: TicketSources,
}

impl SustentacaoService {
    pub fn new(repo: SustentacaoRepository, sources: TicketSources) -> Self {
        Self { repo, sources }
    }

    // =========================================================================
    //  CONFIGURAÇÃO
    // =========================================================================

    pub async fn get_config(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
    ) -> Result<SustentacaoEmpresaConfig, AppError> {
        self.repo
            .get_config(conn, company_id)
            .await?
            .ok_or(AppError::SustentacaoNotConfigured)
    }

    pub async fn list_configs(&self) -> Result<Vec<SustentacaoEmpresaConfig>, AppError> {
        self.repo.list_configs().await
    }

    pub async fn upsert_config(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        payload: &UpsertSustentacaoConfigPayload,
    ) -> Result<SustentacaoEmpresaConfig, AppError> {
        payload.validate()?;

        if payload.data_fim < payload.data_inicio {
            return Err(AppError::InvalidParameter(
                "dataFim anterior a dataInicio".to_string(),
            ));
        }

        let sem_planilha = payload
            .planilha_id
            .as_deref()
            .map(|id| id.trim().is_empty())
            .unwrap_or(true);
        if payload.fonte == FonteTickets::Planilha && sem_planilha {
            return Err(AppError::InvalidParameter(
                "planilhaId é obrigatório para a fonte planilha".to_string(),
            ));
        }

        let config = self.repo.upsert_config(conn, company_id, payload).await?;
        tracing::info!("🛠️ Sustentação configurada para a empresa {}", company_id);
        Ok(config)
    }

    pub async fn delete_config(&self, conn: &mut PgConnection, company_id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_config(conn, company_id).await? {
            Ok(())
        } else {
            Err(AppError::SustentacaoNotConfigured)
        }
    }

    // =========================================================================
    //  SALDO
    // =========================================================================

    /// Tickets de `[from, until]`, numa única busca na fonte.
    async fn fetch_tickets(
        &self,
        config: &SustentacaoEmpresaConfig,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Ticket>, AppError> {
        if from > until {
            return Ok(Vec::new());
        }
        self.sources.fetch_tickets(config, from, until).await
    }

    pub async fn saldo(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        mes_alvo: NaiveDate,
    ) -> Result<SaldoSustentacao, AppError> {
        let config = self.get_config(&mut *conn, company_id).await?;
        if !config.ativo {
            return Err(AppError::SustentacaoNotConfigured);
        }

        let alvo = month_start(mes_alvo);
        let inicio = month_start(config.data_inicio);

        let fechados: HashMap<NaiveDate, SaldoMensal> = self
            .repo
            .list_saldos(&mut *conn, company_id, inicio.min(alvo), alvo)
            .await?
            .into_iter()
            .map(|saldo| (month_start(saldo.mes), saldo))
            .collect();

        let tickets = match janela_de_busca(config.data_inicio, alvo, &fechados) {
            Some((from, until)) => self.fetch_tickets(&config, from, until).await?,
            None => Vec::new(),
        };

        let saldo = calcular_saldo(&Contrato::from(&config), &consumo_por_mes(&tickets), &fechados, alvo);

        tracing::debug!(
            "📊 Saldo de sustentação {} em {}: acumulado {:.2}h, disponível {:.2}h",
            company_id,
            alvo,
            saldo.saldo_acumulado,
            saldo.horas_disponiveis_mes
        );

        Ok(saldo)
    }

    /// Tickets do mês, paginados em memória.
    pub async fn tickets_do_mes(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        mes: NaiveDate,
        params: &PageParams,
    ) -> Result<Page<Ticket>, AppError> {
        let config = self.get_config(conn, company_id).await?;

        let mut tickets = self.fetch_tickets(&config, month_start(mes), month_end(mes)).await?;
        tickets.sort_by(|a, b| b.data.cmp(&a.data).then_with(|| a.id.cmp(&b.id)));

        Ok(Page::from_vec(tickets, params))
    }

    /// Grava a fotografia do mês (recalcula se já existir).
    pub async fn fechar_mes(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        mes: NaiveDate,
        fechado_por: Uuid,
    ) -> Result<SaldoMensal, AppError> {
        let config = self.get_config(&mut *conn, company_id).await?;
        let mes = month_start(mes);

        if mes < month_start(config.data_inicio) || mes > month_start(config.data_fim) {
            return Err(AppError::InvalidParameter(format!(
                "mês {} fora da vigência do contrato",
                mes.format("%Y-%m")
            )));
        }

        let tickets = self.fetch_tickets(&config, mes, month_end(mes)).await?;
        let consumidas: f64 = tickets.iter().map(|t| t.horas).sum();

        // `saldo(mes)` acumula só os meses anteriores
        let anterior = self.saldo(&mut *conn, company_id, mes).await?;
        let (saldo, saldo_acumulado) =
            saldo_de_fechamento(&Contrato::from(&config), consumidas, anterior.saldo_acumulado);

        let snapshot = self
            .repo
            .upsert_saldo(
                &mut *conn,
                company_id,
                mes,
                config.horas_contratadas,
                consumidas,
                saldo,
                saldo_acumulado,
                fechado_por,
            )
            .await?;

        tracing::info!(
            "🔒 Mês {} fechado para a empresa {}: {:.2}h consumidas",
            mes.format("%Y-%m"),
            company_id,
            consumidas
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn contrato(saldo_negativo: bool) -> Contrato {
        Contrato {
            horas_contratadas: 10.0,
            data_inicio: d(2025, 1, 15),
            data_fim: d(2025, 4, 30),
            saldo_negativo,
        }
    }

    fn consumo(pares: &[((i32, u32), f64)]) -> BTreeMap<NaiveDate, f64> {
        pares.iter().map(|((y, m), h)| (d(*y, *m, 1), *h)).collect()
    }

    #[test]
    fn accumulates_months_before_target() {
        let consumo = consumo(&[((2025, 1), 4.0), ((2025, 2), 12.0), ((2025, 3), 7.5)]);
        let saldo = calcular_saldo(&contrato(true), &consumo, &HashMap::new(), d(2025, 3, 20));

        // jan: +6, fev: -2
        assert_eq!(saldo.historico.len(), 2);
        assert_eq!(saldo.saldo_acumulado, 4.0);
        assert_eq!(saldo.saldo_final_proximo_mes, 14.0);
        assert_eq!(saldo.horas_consumidas_mes, 7.5);
        assert_eq!(saldo.saldo_mes_atual, 6.5);
        assert!(saldo.dentro_da_vigencia);
    }

    #[test]
    fn months_outside_contract_are_ignored() {
        // Consumo antes do início e depois do fim não pode entrar na conta
        let consumo = consumo(&[
            ((2024, 12), 50.0),
            ((2025, 1), 10.0),
            ((2025, 4), 10.0),
            ((2025, 5), 50.0),
            ((2025, 6), 50.0),
        ]);
        let saldo = calcular_saldo(&contrato(true), &consumo, &HashMap::new(), d(2025, 7, 1));

        let meses: Vec<NaiveDate> = saldo.historico.iter().map(|m| m.mes).collect();
        assert_eq!(meses, vec![d(2025, 1, 1), d(2025, 2, 1), d(2025, 3, 1), d(2025, 4, 1)]);
        // jan 0, fev 10, mar 10, abr 0
        assert_eq!(saldo.saldo_acumulado, 20.0);
        assert!(!saldo.dentro_da_vigencia);
    }

    #[test]
    fn target_before_contract_has_no_history() {
        let saldo = calcular_saldo(&contrato(false), &BTreeMap::new(), &HashMap::new(), d(2024, 11, 1));

        assert!(saldo.historico.is_empty());
        assert_eq!(saldo.saldo_acumulado, 0.0);
        assert_eq!(saldo.saldo_final_proximo_mes, 10.0);
    }

    #[test]
    fn accumulated_balance_never_negative_without_negative_balance() {
        let consumo = consumo(&[((2025, 1), 25.0), ((2025, 2), 30.0), ((2025, 3), 11.0)]);
        let saldo = calcular_saldo(&contrato(false), &consumo, &HashMap::new(), d(2025, 5, 1));

        assert!(saldo.historico.iter().all(|m| m.saldo >= 0.0 && m.saldo_acumulado >= 0.0));
        // Abril sem consumo: +10
        assert_eq!(saldo.saldo_acumulado, 10.0);

        let com_negativo = calcular_saldo(&contrato(true), &consumo, &HashMap::new(), d(2025, 5, 1));
        assert_eq!(com_negativo.saldo_acumulado, -15.0 - 20.0 - 1.0 + 10.0);
    }

    #[test]
    fn closed_months_override_ticket_consumption() {
        let consumo = consumo(&[((2025, 1), 2.0), ((2025, 2), 2.0)]);
        let mut fechados = HashMap::new();
        fechados.insert(
            d(2025, 1, 1),
            SaldoMensal {
                id: Uuid::new_v4(),
                company_id: Uuid::new_v4(),
                mes: d(2025, 1, 1),
                horas_contratadas: 10.0,
                horas_consumidas: 9.0,
                saldo: 1.0,
                saldo_acumulado: 1.0,
                fechado_em: Utc::now(),
                fechado_por: None,
            },
        );

        let saldo = calcular_saldo(&contrato(true), &consumo, &fechados, d(2025, 3, 1));

        assert_eq!(saldo.historico[0].origem, OrigemSaldo::Fechado);
        assert_eq!(saldo.historico[1].origem, OrigemSaldo::Calculado);
        assert_eq!(saldo.saldo_acumulado, 1.0 + 8.0);
    }

    fn fechado(mes: NaiveDate, consumidas: f64) -> SaldoMensal {
        SaldoMensal {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            mes,
            horas_contratadas: 10.0,
            horas_consumidas: consumidas,
            saldo: 10.0 - consumidas,
            saldo_acumulado: 0.0,
            fechado_em: Utc::now(),
            fechado_por: None,
        }
    }

    #[test]
    fn fetch_window_starts_at_first_open_month() {
        let mut fechados = HashMap::new();
        fechados.insert(d(2025, 1, 1), fechado(d(2025, 1, 1), 3.0));
        fechados.insert(d(2025, 2, 1), fechado(d(2025, 2, 1), 4.0));

        let janela = janela_de_busca(d(2025, 1, 15), d(2025, 4, 10), &fechados);
        assert_eq!(janela, Some((d(2025, 3, 1), d(2025, 4, 30))));

        // Sem fechamentos: uma busca do início do contrato ao fim do alvo
        let janela = janela_de_busca(d(2025, 1, 15), d(2025, 4, 10), &HashMap::new());
        assert_eq!(janela, Some((d(2025, 1, 1), d(2025, 4, 30))));
    }

    #[test]
    fn fetch_window_is_empty_when_everything_is_closed() {
        let fechados: HashMap<_, _> = [d(2025, 1, 1), d(2025, 2, 1), d(2025, 3, 1)]
            .into_iter()
            .map(|mes| (mes, fechado(mes, 1.0)))
            .collect();

        assert_eq!(janela_de_busca(d(2025, 1, 15), d(2025, 3, 1), &fechados), None);
    }

    #[test]
    fn fetch_window_before_contract_covers_only_target() {
        let janela = janela_de_busca(d(2025, 1, 15), d(2024, 11, 5), &HashMap::new());
        assert_eq!(janela, Some((d(2024, 11, 1), d(2024, 11, 30))));
    }

    #[test]
    fn closing_a_month_chains_from_previous_months() {
        let consumo = consumo(&[((2025, 1), 4.0), ((2025, 2), 12.0), ((2025, 3), 7.5)]);
        let anterior = calcular_saldo(&contrato(true), &consumo, &HashMap::new(), d(2025, 3, 1));

        let (saldo, acumulado) = saldo_de_fechamento(&contrato(true), 7.5, anterior.saldo_acumulado);

        // jan +6, fev -2, mar +2.5
        assert_eq!(saldo, 2.5);
        assert_eq!(acumulado, 6.5);
    }

    #[test]
    fn closing_clamps_negative_month_without_negative_balance() {
        let (saldo, acumulado) = saldo_de_fechamento(&contrato(false), 14.0, 3.0);
        assert_eq!(saldo, 0.0);
        assert_eq!(acumulado, 3.0);

        let (saldo, acumulado) = saldo_de_fechamento(&contrato(true), 14.0, 3.0);
        assert_eq!(saldo, -4.0);
        assert_eq!(acumulado, -1.0);
    }

    #[test]
    fn tickets_are_grouped_by_month() {
        let ticket = |data: NaiveDate, horas: f64| Ticket {
            id: "x".to_string(),
            empresa: "ACME".to_string(),
            titulo: None,
            status: None,
            responsavel: None,
            data,
            horas,
        };
        let consumo = consumo_por_mes(&[
            ticket(d(2025, 2, 3), 1.5),
            ticket(d(2025, 2, 28), 2.0),
            ticket(d(2025, 3, 1), 0.5),
        ]);

        assert_eq!(consumo.get(&d(2025, 2, 1)), Some(&3.5));
        assert_eq!(consumo.get(&d(2025, 3, 1)), Some(&0.5));
    }
}
