//! TOML config file under the user's config directory

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, CONFIG_KEYS};
use crate::domain::error::ConfigError;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "HIVISION_CONFIG";

const FILE_NAME: &str = "config.toml";

/// `$HIVISION_CONFIG`, else `<config dir>/hivision/config.toml`
fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hivision")
        .join(FILE_NAME)
}

fn header() -> String {
    let mut text = String::from("# HiVision configuration\n#\n# Keys:\n");
    for chunk in CONFIG_KEYS.chunks(6) {
        text.push_str("#   ");
        text.push_str(&chunk.join(", "));
        text.push('\n');
    }
    text.push('\n');
    text
}

/// Config store backed by one TOML file
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        Self::with_path(default_path())
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, content: &str) -> Result<AppConfig, ConfigError> {
        parse_toml(content).map_err(|e| match e {
            ConfigError::ParseError(msg) => {
                ConfigError::ParseError(format!("{}: {msg}", self.path.display()))
            }
            other => other,
        })
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write through a sibling file so a crash never truncates the config
    async fn write(&self, content: String) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::WriteError(e.to_string());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let scratch = self.scratch_path();
        fs::write(&scratch, content).await.map_err(write_err)?;
        if let Err(e) = fs::rename(&scratch, &self.path).await {
            let _ = fs::remove_file(&scratch).await;
            return Err(write_err(e));
        }
        Ok(())
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_toml(content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.exists() {
            return Ok(AppConfig::empty());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::ReadError(format!("{}: {e}", self.path.display())))?;
        self.parse(&content)
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.write(to_toml(config)?).await
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.to_string_lossy().to_string(),
            ));
        }
        let body = to_toml(&AppConfig::defaults())?;
        self.write(header() + &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_path() {
        let store = XdgConfigStore::with_path("/custom/path/config.toml");
        assert_eq!(store.path(), PathBuf::from("/custom/path/config.toml"));
        assert_eq!(
            store.scratch_path(),
            PathBuf::from("/custom/path/config.toml.tmp")
        );
    }

    #[test]
    fn parse_recording_keys() {
        let content = r#"
quality = "ultra"
region = "0,0,640x480"
audio = true
sample_rate = 48000
max_duration = "10m"
"#;

        let config = parse_toml(content).unwrap();
        assert_eq!(config.quality.as_deref(), Some("ultra"));
        assert_eq!(config.region.as_deref(), Some("0,0,640x480"));
        assert_eq!(config.audio, Some(true));
        assert_eq!(config.sample_rate, Some(48000));
        assert_eq!(config.max_duration.as_deref(), Some("10m"));
        assert_eq!(config.fps, None);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let store = XdgConfigStore::with_path("/etc/hv.toml");
        match store.parse("fps = \"fast\"") {
            Err(ConfigError::ParseError(msg)) => assert!(msg.starts_with("/etc/hv.toml: ")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn header_is_all_comments() {
        let header = header();
        assert!(header.lines().all(|l| l.is_empty() || l.starts_with('#')));
        assert!(header.contains("max_duration"));
        assert!(header.contains("ffmpeg_path"));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("none.toml"));
        assert_eq!(store.load().await.unwrap(), AppConfig::empty());
    }

    #[tokio::test]
    async fn save_then_load_leaves_no_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("nested/config.toml"));
        let config = AppConfig {
            quality: Some("low".into()),
            timestamp: Some(false),
            ..AppConfig::default()
        };
        store.save(&config).await.unwrap();
        assert_eq!(store.load().await.unwrap(), config);
        assert!(!store.scratch_path().exists());
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        store.init().await.unwrap();
        assert_eq!(store.load().await.unwrap(), AppConfig::defaults());
        let written = std::fs::read_to_string(store.path()).unwrap();
        assert!(written.starts_with("# HiVision configuration"));
        assert!(matches!(store.init().await, Err(ConfigError::AlreadyExists(_))));
    }
}
