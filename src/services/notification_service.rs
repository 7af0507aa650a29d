// src/services/notification_service.rs

use std::{collections::HashSet, time::Duration};

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::PgConnection;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageParams},
    },
    db::{NotificationRepository, TaskRepository},
    models::notification::{DeadlineCandidate, NewNotification, Notification, NotificationKind, UnreadCount},
    services::mailer::Mailer,
};

const BROADCAST_CAPACITY: usize = 256;

/// Classifica o prazo de uma tarefa aberta.
///
/// Vencida antes de hoje é `overdue`, hoje ou amanhã é `urgent`, dentro da
/// janela de aviso é `deadline_warning`.
pub fn alert_kind(end_date: NaiveDate, today: NaiveDate, warning_days: i64) -> Option<NotificationKind> {
    let days_left = (end_date - today).num_days();
    match days_left {
        d if d < 0 => Some(NotificationKind::Overdue),
        0 | 1 => Some(NotificationKind::Urgent),
        d if d <= warning_days => Some(NotificationKind::DeadlineWarning),
        _ => None,
    }
}

/// Limites em UTC do dia civil `day` no fuso `tz`: `[início, início do dia seguinte)`.
pub fn day_bounds_utc<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_of = |d: NaiveDate| {
        let midnight = d.and_time(NaiveTime::MIN);
        tz.from_local_datetime(&midnight)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    };
    (start_of(day), start_of(day.succ_opt().unwrap_or(NaiveDate::MAX)))
}

/// Alertas a enviar: classifica cada candidato e descarta o que já saiu hoje
/// para o mesmo usuário, tarefa e tipo.
pub fn pending_alerts<'a>(
    candidates: &'a [DeadlineCandidate],
    today: NaiveDate,
    warning_days: i64,
    sent_today: &HashSet<(Uuid, Uuid, NotificationKind)>,
) -> Vec<(&'a DeadlineCandidate, NotificationKind)> {
    let mut seen = sent_today.clone();
    candidates
        .iter()
        .filter_map(|c| alert_kind(c.end_date, today, warning_days).map(|kind| (c, kind)))
        .filter(|(c, kind)| seen.insert((c.recipient_id, c.task_id, *kind)))
        .collect()
}

fn alert_text(candidate: &DeadlineCandidate, kind: NotificationKind, today: NaiveDate) -> (String, String) {
    let due = candidate.end_date.format("%d/%m/%Y");
    match kind {
        NotificationKind::Overdue => (
            format!("Tarefa atrasada: {}", candidate.task_title),
            format!(
                "A tarefa '{}' do projeto '{}' venceu em {} ({} dia(s) de atraso).",
                candidate.task_title,
                candidate.project_name,
                due,
                (today - candidate.end_date).num_days()
            ),
        ),
        NotificationKind::Urgent => (
            format!("Tarefa vence em breve: {}", candidate.task_title),
            format!(
                "A tarefa '{}' do projeto '{}' vence em {}.",
                candidate.task_title, candidate.project_name, due
            ),
        ),
        _ => (
            format!("Prazo se aproximando: {}", candidate.task_title),
            format!(
                "A tarefa '{}' do projeto '{}' vence em {} ({} dia(s)).",
                candidate.task_title,
                candidate.project_name,
                due,
                (candidate.end_date - today).num_days()
            ),
        ),
    }
}

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    task_repo: TaskRepository,
    mailer: Mailer,
    hub: broadcast::Sender<Notification>,
    warning_days: i64,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, task_repo: TaskRepository, mailer: Mailer, warning_days: i64) -> Self {
        let (hub, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { repo, task_repo, mailer, hub, warning_days }
    }

    /// Canal de tempo real; o SSE filtra pelo destinatário.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.hub.subscribe()
    }

    fn publish(&self, notification: &Notification) {
        // Sem assinantes o envio falha, e tudo bem
        let _ = self.hub.send(notification.clone());
    }

    // =========================================================================
    //  CAIXA DE ENTRADA
    // =========================================================================

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        unread_only: bool,
        params: &PageParams,
    ) -> Result<Page<Notification>, AppError> {
        let (limit, offset) = params.limit_offset();
        let total = self.repo.count_for_user(&mut *conn, user_id, unread_only).await?;
        let items = self
            .repo
            .list_for_user(&mut *conn, user_id, unread_only, limit, offset)
            .await?;

        Ok(Page {
            items,
            pagination: params.window(total.max(0) as u64),
        })
    }

    pub async fn unread_count(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<UnreadCount, AppError> {
        let unread = self.repo.count_for_user(conn, user_id, true).await?;
        Ok(UnreadCount { unread })
    }

    pub async fn mark_read(&self, conn: &mut PgConnection, user_id: Uuid, notification_id: Uuid) -> Result<(), AppError> {
        if !self.repo.mark_read(conn, user_id, notification_id).await? {
            return Err(AppError::ResourceNotFound("notificação".to_string()));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<u64, AppError> {
        self.repo.mark_all_read(conn, user_id).await
    }

    /// Grava, publica no canal e envia por e-mail.
    pub async fn notify(&self, input: &NewNotification, email: Option<&str>) -> Result<Notification, AppError> {
        let notification = self.repo.insert_with_pool(input).await?;
        self.publish(&notification);

        if let Some(to) = email {
            self.mailer.send(to, &notification.title, &notification.message).await;
        }
        Ok(notification)
    }

    // =========================================================================
    //  VARREDURA DE PRAZOS
    // =========================================================================

    /// Uma passada: marca atrasadas e gera os alertas do dia.
    /// Retorna quantas notificações novas foram criadas.
    pub async fn scan_deadlines(&self, today: NaiveDate) -> Result<usize, AppError> {
        let delayed = self.task_repo.mark_overdue_as_delayed(today).await?;
        if delayed > 0 {
            tracing::info!("⏰ {} tarefa(s) marcadas como atrasadas", delayed);
        }

        let until = today + chrono::Duration::days(self.warning_days);
        let candidates = self.repo.deadline_candidates(until).await?;

        // "Hoje" é o dia civil do servidor da aplicação, não o do banco
        let (day_start, day_end) = day_bounds_utc(&Local, today);
        let sent_today: HashSet<_> = self
            .repo
            .deadline_alerts_between(day_start, day_end)
            .await?
            .into_iter()
            .collect();

        let mut created = 0;
        for (candidate, kind) in pending_alerts(&candidates, today, self.warning_days, &sent_today) {
            let (title, message) = alert_text(candidate, kind, today);
            let input = NewNotification {
                user_id: candidate.recipient_id,
                company_id: Some(candidate.company_id),
                kind,
                title,
                message,
                reference_id: Some(candidate.task_id),
            };

            match self.notify(&input, Some(&candidate.recipient_email)).await {
                Ok(_) => created += 1,
                Err(e) => tracing::error!(
                    "❌ Falha ao notificar {} sobre a tarefa {}: {:?}",
                    candidate.recipient_id,
                    candidate.task_id,
                    e
                ),
            }
        }

        Ok(created)
    }

    /// Laço da varredura, para rodar em `tokio::spawn`.
    pub async fn run_deadline_scanner(self, every: Duration) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!("🔔 Varredura de prazos ativa (a cada {}s)", every.as_secs());
        loop {
            interval.tick().await;
            let today = Local::now().date_naive();

            match self.scan_deadlines(today).await {
                Ok(0) => tracing::debug!("Varredura de prazos: nada a notificar"),
                Ok(n) => tracing::info!("🔔 Varredura de prazos: {} notificação(ões) criadas", n),
                Err(e) => tracing::error!("❌ Falha na varredura de prazos: {:?}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn deadline_classification() {
        let today = day(10);

        assert_eq!(alert_kind(day(9), today, 3), Some(NotificationKind::Overdue));
        assert_eq!(alert_kind(day(10), today, 3), Some(NotificationKind::Urgent));
        assert_eq!(alert_kind(day(11), today, 3), Some(NotificationKind::Urgent));
        assert_eq!(alert_kind(day(12), today, 3), Some(NotificationKind::DeadlineWarning));
        assert_eq!(alert_kind(day(13), today, 3), Some(NotificationKind::DeadlineWarning));
        assert_eq!(alert_kind(day(14), today, 3), None);
    }

    fn candidate(end_date: NaiveDate) -> DeadlineCandidate {
        DeadlineCandidate {
            task_id: Uuid::new_v4(),
            task_title: "Migrar base".to_string(),
            project_name: "ERP".to_string(),
            company_id: Uuid::new_v4(),
            end_date,
            recipient_id: Uuid::new_v4(),
            recipient_email: "ana@acme.com".to_string(),
            recipient_name: "Ana".to_string(),
        }
    }

    #[test]
    fn alerts_already_sent_today_are_skipped() {
        let today = day(10);
        let overdue = candidate(day(8));
        let urgent = candidate(day(11));
        let far = candidate(day(20));

        let mut sent = HashSet::new();
        sent.insert((overdue.recipient_id, overdue.task_id, NotificationKind::Overdue));
        // Tipo diferente para a mesma tarefa não bloqueia
        sent.insert((urgent.recipient_id, urgent.task_id, NotificationKind::DeadlineWarning));

        let candidates = vec![overdue, urgent.clone(), far];
        let pending = pending_alerts(&candidates, today, 3, &sent);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0.task_id, urgent.task_id);
        assert_eq!(pending[0].1, NotificationKind::Urgent);
    }

    #[test]
    fn duplicate_candidates_alert_once() {
        let one = candidate(day(9));
        let candidates = vec![one.clone(), one];

        let pending = pending_alerts(&candidates, day(10), 3, &HashSet::new());

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].1, NotificationKind::Overdue);
    }

    #[test]
    fn day_bounds_follow_the_app_timezone() {
        let brasilia = FixedOffset::west_opt(3 * 3600).unwrap();
        let (start, end) = day_bounds_utc(&brasilia, day(10));

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 5, 10, 3, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 5, 11, 3, 0, 0).unwrap());

        let (start, _) = day_bounds_utc(&Utc, day(10));
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn overdue_text_counts_days_late() {
        let candidate = candidate(day(7));

        let (title, message) = alert_text(&candidate, NotificationKind::Overdue, day(10));

        assert_eq!(title, "Tarefa atrasada: Migrar base");
        assert!(message.contains("07/05/2025"));
        assert!(message.contains("3 dia(s) de atraso"));
    }
}
