pub mod admin;
pub mod auth;
pub mod company;
pub mod finance;
pub mod hours;
pub mod notification;
pub mod project;
pub mod sustentacao;
pub mod task;
