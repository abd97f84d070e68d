pub mod alerts;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod session;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
