pub mod user_repo;
pub use user_repo::UserRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod project_repo;
pub use project_repo::ProjectRepository;
pub mod task_repo;
pub use task_repo::TaskRepository;
pub mod hours_repo;
pub use hours_repo::HoursRepository;
pub mod sustentacao_repo;
pub use sustentacao_repo::SustentacaoRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
