//! Persisted application configuration

mod app_config;

pub use app_config::{default_output_dir, parse_bool, AppConfig, CONFIG_KEYS};
