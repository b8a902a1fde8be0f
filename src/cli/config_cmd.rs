//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, CONFIG_KEYS};
use crate::domain::error::ConfigError;

use super::args::ConfigAction;
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let mut config = store.load().await?;
    config.set(key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value.trim()));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    let config = store.load().await?;
    match config.get(key)? {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }
    Ok(())
}

/// Every key with its effective value; values not in the file are marked
async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let file = store.load().await?;
    let defaults = AppConfig::defaults();
    for key in CONFIG_KEYS {
        presenter.key_value(key, &describe(key, &file, &defaults)?);
    }
    Ok(())
}

fn describe(key: &str, file: &AppConfig, defaults: &AppConfig) -> Result<String, ConfigError> {
    Ok(match (file.get(key)?, defaults.get(key)?) {
        (Some(value), _) => value,
        (None, Some(default)) => format!("{default} (default)"),
        (None, None) => NOT_SET.to_string(),
    })
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}
