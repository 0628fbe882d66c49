//! Process configuration

mod app;

pub use app::{AppConfig, ConfigError};
