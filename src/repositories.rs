pub mod app_settings;
pub mod packages;
pub mod session;
pub mod transactions;
pub mod users;
