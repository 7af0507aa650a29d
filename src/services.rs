pub mod auth;
pub mod company_service;
pub mod finance_service;
pub mod hours_service;
pub mod mailer;
pub mod notification_service;
pub mod project_service;
pub mod sustentacao_service;
pub mod task_service;
pub mod tickets;
pub mod user_service;
