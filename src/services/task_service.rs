// src/services/task_service.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{ProjectRepository, TaskRepository},
    models::{
        project::ProjectSummary,
        task::{
            CompleteTaskPayload, CreateTaskPayload, DependencyBadge, DependencyCheck, DependencyType,
            GanttTask, RegisterDelayPayload, ScheduleStatus, SetDependencyPayload, Task, TaskStatus,
            TaskUpdateResponse, UpdateTaskPayload,
        },
    },
};

// =============================================================================
//  REGRAS PURAS
// =============================================================================

/// Situação da dependência finish-to-start da tarefa.
pub fn check_dependency(task: &Task, predecessor: Option<&Task>) -> DependencyCheck {
    match (task.dependency_type, predecessor) {
        (DependencyType::FinishToStart, Some(pred)) => {
            let done = pred.status.is_done();
            DependencyCheck {
                can_start: done,
                badge: if done { DependencyBadge::Liberada } else { DependencyBadge::Bloqueada },
                predecessor_task_id: Some(pred.id),
                predecessor_status: Some(pred.status),
            }
        }
        _ => DependencyCheck {
            can_start: true,
            badge: DependencyBadge::Livre,
            predecessor_task_id: None,
            predecessor_status: None,
        },
    }
}

/// `true` se apontar `task_id -> predecessor_id` fecha um ciclo.
///
/// `links` mapeia cada tarefa do projeto para a sua predecessora atual.
pub fn creates_cycle(task_id: Uuid, predecessor_id: Uuid, links: &HashMap<Uuid, Option<Uuid>>) -> bool {
    let mut current = Some(predecessor_id);
    let mut steps = 0;

    while let Some(id) = current {
        if id == task_id {
            return true;
        }
        steps += 1;
        if steps > links.len() {
            // Já existe um ciclo antigo fora deste caminho
            return false;
        }
        current = links.get(&id).copied().flatten();
    }
    false
}

/// Predecessora precisa ser outra tarefa do mesmo projeto, sem ciclo.
pub fn validate_predecessor(task_id: Uuid, predecessor_id: Uuid, project_tasks: &[Task]) -> Result<(), AppError> {
    if task_id == predecessor_id {
        return Err(AppError::InvalidPredecessor);
    }
    if !project_tasks.iter().any(|t| t.id == predecessor_id) {
        return Err(AppError::InvalidPredecessor);
    }

    let links: HashMap<Uuid, Option<Uuid>> = project_tasks
        .iter()
        .map(|t| {
            let pred = match t.dependency_type {
                DependencyType::FinishToStart => t.predecessor_task_id,
                DependencyType::Independent => None,
            };
            (t.id, pred)
        })
        .collect();

    if creates_cycle(task_id, predecessor_id, &links) {
        return Err(AppError::DependencyCycle);
    }
    Ok(())
}

/// Compara a data real (ou hoje, para tarefas abertas) com o prazo planejado.
pub fn classify(task: &Task, today: NaiveDate) -> (ScheduleStatus, i64) {
    let reference = match task.status {
        TaskStatus::Cancelled => return (ScheduleStatus::OnTime, 0),
        status if status.is_done() => match task.actual_end_date {
            Some(actual) => actual,
            None => return (ScheduleStatus::OnTime, 0),
        },
        _ => today,
    };

    // Prazo original, caso a data planejada tenha sido reescrita
    let planned = task.original_end_date.unwrap_or(task.end_date);
    let diff = (reference - planned).num_days();

    if diff > 0 {
        (ScheduleStatus::Delayed, diff)
    } else if diff < 0 && task.status.is_done() {
        (ScheduleStatus::Early, 0)
    } else {
        (ScheduleStatus::OnTime, 0)
    }
}

/// Pré-condições de `in_progress | delayed -> completed_delayed`.
pub fn validate_delay(task: &Task, actual_end_date: NaiveDate, justification: &str) -> Result<(), AppError> {
    if !matches!(task.status, TaskStatus::InProgress | TaskStatus::Delayed) {
        return Err(AppError::InvalidTaskTransition(task.status.as_str().to_string()));
    }
    if actual_end_date <= task.end_date {
        return Err(AppError::InvalidDelayDate);
    }
    if justification.trim().is_empty() {
        return Err(AppError::DelayJustificationRequired);
    }
    Ok(())
}

/// Conclusão simples: só dentro do prazo.
pub fn validate_completion(task: &Task, actual_end_date: NaiveDate) -> Result<(), AppError> {
    if !task.status.is_open() {
        return Err(AppError::InvalidTaskTransition(task.status.as_str().to_string()));
    }
    if actual_end_date > task.end_date {
        return Err(AppError::DelayJustificationRequired);
    }
    Ok(())
}

pub fn summarize(project_id: Uuid, tasks: &[Task], today: NaiveDate) -> ProjectSummary {
    let mut summary = ProjectSummary {
        project_id,
        total_tasks: tasks.len() as u32,
        completed_tasks: 0,
        cancelled_tasks: 0,
        on_time: 0,
        delayed: 0,
        early: 0,
        progress_percent: 0.0,
    };

    for task in tasks {
        if task.status == TaskStatus::Cancelled {
            summary.cancelled_tasks += 1;
            continue;
        }
        if task.status.is_done() {
            summary.completed_tasks += 1;
        }
        match classify(task, today).0 {
            ScheduleStatus::OnTime => summary.on_time += 1,
            ScheduleStatus::Delayed => summary.delayed += 1,
            ScheduleStatus::Early => summary.early += 1,
        }
    }

    let active = summary.total_tasks - summary.cancelled_tasks;
    if active > 0 {
        let percent = summary.completed_tasks as f64 * 100.0 / active as f64;
        summary.progress_percent = (percent * 10.0).round() / 10.0;
    }
    summary
}

fn blocked_warning(check: &DependencyCheck) -> Option<String> {
    match (check.badge, check.predecessor_task_id) {
        (DependencyBadge::Bloqueada, Some(pred)) => Some(format!(
            "A tarefa depende da conclusão da predecessora {} (finish-to-start).",
            pred
        )),
        _ => None,
    }
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct TaskService {
    repo: TaskRepository,
    project_repo: ProjectRepository,
}

impl TaskService {
    pub fn new(repo: TaskRepository, project_repo: ProjectRepository) -> Self {
        Self { repo, project_repo }
    }

    async fn find_task(&self, conn: &mut PgConnection, company_id: Uuid, task_id: Uuid) -> Result<Task, AppError> {
        self.repo
            .find_in_company(conn, company_id, task_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("tarefa".to_string()))
    }

    async fn ensure_project(&self, conn: &mut PgConnection, company_id: Uuid, project_id: Uuid) -> Result<(), AppError> {
        self.project_repo
            .find_by_id(conn, company_id, project_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::ResourceNotFound("projeto".to_string()))
    }

    pub async fn create_task(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
        payload: &CreateTaskPayload,
    ) -> Result<Task, AppError> {
        payload.validate()?;
        if let Some(start) = payload.start_date {
            if start > payload.end_date {
                return Err(AppError::InvalidParameter("startDate posterior a endDate".to_string()));
            }
        }

        self.ensure_project(&mut *conn, company_id, project_id).await?;

        if payload.dependency_type == Some(DependencyType::FinishToStart) {
            let pred = payload.predecessor_task_id.ok_or(AppError::InvalidPredecessor)?;
            let tasks = self.repo.list_by_project(&mut *conn, project_id).await?;
            // Tarefa nova: ninguém aponta para ela, então não há ciclo possível
            validate_predecessor(Uuid::nil(), pred, &tasks)?;
        }

        let task = self.repo.create_task(&mut *conn, project_id, payload).await?;
        tracing::info!("🗂️ Tarefa '{}' criada no projeto {}", task.title, project_id);
        Ok(task)
    }

    /// Tarefas do projeto em ordem de Gantt, com classificação e dependência.
    pub async fn list_gantt(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<GanttTask>, AppError> {
        self.ensure_project(&mut *conn, company_id, project_id).await?;
        let tasks = self.repo.list_by_project(&mut *conn, project_id).await?;

        let by_id: HashMap<Uuid, &Task> = tasks.iter().map(|t| (t.id, t)).collect();

        let gantt = tasks
            .iter()
            .map(|task| {
                let predecessor = task.predecessor_task_id.and_then(|id| by_id.get(&id).copied());
                let (schedule_status, delay_days) = classify(task, today);
                GanttTask {
                    task: task.clone(),
                    schedule_status,
                    delay_days,
                    dependency: check_dependency(task, predecessor),
                }
            })
            .collect();

        Ok(gantt)
    }

    pub async fn update_task(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        task_id: Uuid,
        payload: &UpdateTaskPayload,
    ) -> Result<TaskUpdateResponse, AppError> {
        payload.validate()?;
        let current = self.find_task(&mut *conn, company_id, task_id).await?;

        // Conclusão passa pelos fluxos próprios (prazo e justificativa)
        if matches!(payload.status, Some(status) if status.is_done()) {
            return Err(AppError::InvalidTaskTransition(current.status.as_str().to_string()));
        }

        let start = payload.start_date.or(current.start_date);
        let end = payload.end_date.unwrap_or(current.end_date);
        if matches!(start, Some(start) if start > end) {
            return Err(AppError::InvalidParameter("startDate posterior a endDate".to_string()));
        }

        let mut warnings = Vec::new();
        if payload.status == Some(TaskStatus::InProgress) {
            let check = self.dependency_for(&mut *conn, company_id, &current).await?;
            if let Some(warning) = blocked_warning(&check) {
                tracing::warn!("⚠️ Tarefa {} iniciada com dependência pendente", task_id);
                warnings.push(warning);
            }
        }

        let task = self.repo.update_task(&mut *conn, task_id, payload).await?;
        Ok(TaskUpdateResponse { task, warnings })
    }

    pub async fn set_dependency(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        task_id: Uuid,
        payload: &SetDependencyPayload,
    ) -> Result<TaskUpdateResponse, AppError> {
        let current = self.find_task(&mut *conn, company_id, task_id).await?;

        let predecessor = match payload.dependency_type {
            DependencyType::Independent => None,
            DependencyType::FinishToStart => {
                let pred = payload.predecessor_task_id.ok_or(AppError::InvalidPredecessor)?;
                let tasks = self.repo.list_by_project(&mut *conn, current.project_id).await?;
                validate_predecessor(task_id, pred, &tasks)?;
                Some(pred)
            }
        };

        let task = self
            .repo
            .set_dependency(&mut *conn, task_id, payload.dependency_type, predecessor)
            .await?;

        let mut warnings = Vec::new();
        if task.status == TaskStatus::InProgress {
            let check = self.dependency_for(&mut *conn, company_id, &task).await?;
            warnings.extend(blocked_warning(&check));
        }

        Ok(TaskUpdateResponse { task, warnings })
    }

    async fn dependency_for(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        task: &Task,
    ) -> Result<DependencyCheck, AppError> {
        let predecessor = match (task.dependency_type, task.predecessor_task_id) {
            (DependencyType::FinishToStart, Some(pred)) => self.repo.find_in_company(conn, company_id, pred).await?,
            _ => None,
        };
        Ok(check_dependency(task, predecessor.as_ref()))
    }

    pub async fn dependency_status(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        task_id: Uuid,
    ) -> Result<DependencyCheck, AppError> {
        let task = self.find_task(&mut *conn, company_id, task_id).await?;
        self.dependency_for(conn, company_id, &task).await
    }

    pub async fn complete_task(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        task_id: Uuid,
        payload: &CompleteTaskPayload,
        today: NaiveDate,
    ) -> Result<Task, AppError> {
        let task = self.find_task(&mut *conn, company_id, task_id).await?;
        let actual = payload.actual_end_date.unwrap_or(today);

        validate_completion(&task, actual)?;

        let task = self.repo.complete_task(&mut *conn, task_id, actual).await?;
        tracing::info!("✅ Tarefa {} concluída em {}", task_id, actual);
        Ok(task)
    }

    /// Conclusão com atraso: grava data real, justificativa e autoria.
    pub async fn register_delay<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        task_id: Uuid,
        payload: &RegisterDelayPayload,
        user_id: Uuid,
    ) -> Result<Task, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        payload.validate()?;

        let mut tx = executor.begin().await?;

        let task = self
            .repo
            .find_in_company(&mut *tx, company_id, task_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("tarefa".to_string()))?;

        validate_delay(&task, payload.actual_end_date, &payload.justification)?;

        let updated = self
            .repo
            .register_delay(
                &mut *tx,
                task_id,
                payload.actual_end_date,
                payload.justification.trim(),
                user_id,
            )
            .await?
            // Outra requisição mudou o status entre a leitura e a escrita
            .ok_or_else(|| AppError::InvalidTaskTransition(task.status.as_str().to_string()))?;

        tx.commit().await?;

        tracing::info!(
            "⏰ Atraso registrado na tarefa {}: prevista {}, real {}",
            task_id,
            task.end_date,
            payload.actual_end_date
        );
        Ok(updated)
    }

    pub async fn project_summary(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        project_id: Uuid,
        today: NaiveDate,
    ) -> Result<ProjectSummary, AppError> {
        self.ensure_project(&mut *conn, company_id, project_id).await?;
        let tasks = self.repo.list_by_project(&mut *conn, project_id).await?;
        Ok(summarize(project_id, &tasks, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn task(status: TaskStatus, end: NaiveDate) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            title: "Tarefa".to_string(),
            description: None,
            assignee_id: None,
            status,
            start_date: None,
            end_date: end,
            actual_end_date: None,
            original_end_date: None,
            delay_justification: None,
            delay_created_at: None,
            delay_created_by: None,
            dependency_type: DependencyType::Independent,
            predecessor_task_id: None,
            estimated_hours: None,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn depends_on(mut t: Task, pred: &Task) -> Task {
        t.dependency_type = DependencyType::FinishToStart;
        t.predecessor_task_id = Some(pred.id);
        t
    }

    #[test]
    fn delay_requires_date_strictly_after_planned_end() {
        let t = task(TaskStatus::InProgress, d(2025, 2, 14));

        assert!(matches!(validate_delay(&t, d(2025, 2, 14), "motivo"), Err(AppError::InvalidDelayDate)));
        assert!(matches!(validate_delay(&t, d(2025, 2, 10), "motivo"), Err(AppError::InvalidDelayDate)));
        assert!(validate_delay(&t, d(2025, 2, 15), "motivo").is_ok());
    }

    #[test]
    fn delay_requires_justification_and_open_status() {
        let t = task(TaskStatus::Delayed, d(2025, 2, 14));
        assert!(matches!(
            validate_delay(&t, d(2025, 2, 20), "   "),
            Err(AppError::DelayJustificationRequired)
        ));

        for status in [TaskStatus::Todo, TaskStatus::Completed, TaskStatus::CompletedDelayed, TaskStatus::Cancelled] {
            let t = task(status, d(2025, 2, 14));
            assert!(matches!(
                validate_delay(&t, d(2025, 2, 20), "motivo"),
                Err(AppError::InvalidTaskTransition(_))
            ));
        }
    }

    #[test]
    fn late_completion_needs_the_delay_flow() {
        let t = task(TaskStatus::InProgress, d(2025, 2, 14));
        assert!(validate_completion(&t, d(2025, 2, 14)).is_ok());
        assert!(matches!(
            validate_completion(&t, d(2025, 2, 15)),
            Err(AppError::DelayJustificationRequired)
        ));
    }

    #[test]
    fn dependency_badges() {
        let pred = task(TaskStatus::InProgress, d(2025, 2, 1));
        let livre = task(TaskStatus::Todo, d(2025, 2, 10));
        assert_eq!(check_dependency(&livre, None).badge, DependencyBadge::Livre);

        let dependent = depends_on(task(TaskStatus::Todo, d(2025, 2, 10)), &pred);
        let blocked = check_dependency(&dependent, Some(&pred));
        assert_eq!(blocked.badge, DependencyBadge::Bloqueada);
        assert!(!blocked.can_start);

        let mut done = pred.clone();
        done.status = TaskStatus::CompletedDelayed;
        let released = check_dependency(&dependent, Some(&done));
        assert_eq!(released.badge, DependencyBadge::Liberada);
        assert!(released.can_start);
    }

    #[test]
    fn predecessor_must_be_another_task_of_the_project_without_cycles() {
        let a = task(TaskStatus::Todo, d(2025, 2, 1));
        let b = depends_on(task(TaskStatus::Todo, d(2025, 2, 5)), &a);
        let c = depends_on(task(TaskStatus::Todo, d(2025, 2, 9)), &b);
        let tasks = vec![a.clone(), b.clone(), c.clone()];

        assert!(matches!(validate_predecessor(a.id, a.id, &tasks), Err(AppError::InvalidPredecessor)));
        assert!(matches!(
            validate_predecessor(a.id, Uuid::new_v4(), &tasks),
            Err(AppError::InvalidPredecessor)
        ));
        // a -> c -> b -> a
        assert!(matches!(validate_predecessor(a.id, c.id, &tasks), Err(AppError::DependencyCycle)));
        assert!(validate_predecessor(c.id, a.id, &tasks).is_ok());
    }

    #[test]
    fn classification_against_planned_end() {
        let today = d(2025, 3, 10);

        let mut early = task(TaskStatus::Completed, d(2025, 3, 5));
        early.actual_end_date = Some(d(2025, 3, 3));
        assert_eq!(classify(&early, today), (ScheduleStatus::Early, 0));

        let mut late = task(TaskStatus::CompletedDelayed, d(2025, 3, 5));
        late.actual_end_date = Some(d(2025, 3, 8));
        assert_eq!(classify(&late, today), (ScheduleStatus::Delayed, 3));

        let open_overdue = task(TaskStatus::InProgress, d(2025, 3, 7));
        assert_eq!(classify(&open_overdue, today), (ScheduleStatus::Delayed, 3));

        let open_ahead = task(TaskStatus::Todo, d(2025, 3, 20));
        assert_eq!(classify(&open_ahead, today), (ScheduleStatus::OnTime, 0));
    }

    #[test]
    fn summary_ignores_cancelled_tasks_in_progress() {
        let today = d(2025, 3, 10);
        let mut done = task(TaskStatus::Completed, d(2025, 3, 5));
        done.actual_end_date = Some(d(2025, 3, 5));
        let tasks = vec![
            done,
            task(TaskStatus::InProgress, d(2025, 3, 1)),
            task(TaskStatus::Todo, d(2025, 3, 30)),
            task(TaskStatus::Cancelled, d(2025, 3, 1)),
        ];

        let summary = summarize(Uuid::nil(), &tasks, today);

        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.cancelled_tasks, 1);
        assert_eq!(summary.completed_tasks, 1);
        assert_eq!(summary.on_time, 2);
        assert_eq!(summary.delayed, 1);
        assert_eq!(summary.progress_percent, 33.3);
    }
}
