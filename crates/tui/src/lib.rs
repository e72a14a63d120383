pub mod app;
pub mod cache;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod login;
pub mod router;
pub mod session;
pub mod ui;
