pub mod admins;
pub mod auth;
pub mod companies;
pub mod finance;
pub mod hours;
pub mod notifications;
pub mod projects;
pub mod sustentacao;
pub mod tasks;
pub mod users;
