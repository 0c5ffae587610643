pub mod app_settings;
pub mod packages;
pub mod telegram;
pub mod transactions;
pub mod users;
