// lnd-config/src/settings.rs
use ::config::{Config as AppConfig, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "lnd-config.toml";
pub const ENV_PREFIX: &str = "LND_CONFIG";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordSettings {
    pub path: PathBuf,
    /// Version of the stored record, as last written by a migration.
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub record: RecordSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Built-in defaults, then `file` if it exists, then `LND_CONFIG__*`
    /// variables (`LND_CONFIG__SERVER__PORT=9000`).
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        let file = file.unwrap_or(Path::new(DEFAULT_SETTINGS_FILE));
        let settings = AppConfig::builder()
            .set_default("record.path", "config.yaml")?
            .set_default("record.version", crate::migrations::CURRENT_VERSION)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .add_source(
                File::from(file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        tracing::debug!(file = %file.display(), ?settings, "loaded settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let settings = Settings::load(Some(missing.as_path())).unwrap();
        assert_eq!(settings.record.path, PathBuf::from("config.yaml"));
        assert_eq!(settings.record.version, "0.20.1");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lnd-config.toml");
        fs::write(
            &path,
            "[record]\npath = \"/data/start9/config.yaml\"\nversion = \"0.17.0\"\n\n[server]\nport = 9090\n",
        )
        .unwrap();
        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.record.path, PathBuf::from("/data/start9/config.yaml"));
        assert_eq!(settings.record.version, "0.17.0");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9090);
    }

    #[test]
    fn bad_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lnd-config.toml");
        fs::write(&path, "[server]\nport = \"not a port\"\n").unwrap();
        assert!(Settings::load(Some(path.as_path())).is_err());
    }
}
