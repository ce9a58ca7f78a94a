//! Controller configuration.
//!
//! Stored as TOML at `$CAMCTL_CONFIG` when set, otherwise
//! `~/.config/camctl/controller.toml`. A missing file is created with
//! the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use camctl_link::ServerConfig;
use camctl_protocol::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CAMCTL_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// TCP port of the link server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Where pictures are downloaded after exposure.
    #[serde(default = "default_download_folder")]
    pub download_folder: PathBuf,

    /// Outbound ring buffer capacity in bytes.
    #[serde(default = "default_send_buffer_size")]
    pub send_buffer_size: usize,

    #[serde(default = "default_chunk_size")]
    pub recv_chunk_size: usize,

    #[serde(default = "default_chunk_size")]
    pub send_chunk_size: usize,

    /// Minimum level of log lines streamed to the client.
    #[serde(default = "default_remote_log_level")]
    pub remote_log_level: String,

    /// Period of status telemetry and heartbeat, 0 disables both.
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,

    #[serde(default)]
    pub camera: CameraConfig,
}

/// Settings of the simulated camera driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Extra time each capture takes on top of the exposure.
    #[serde(default)]
    pub capture_latency_ms: u64,

    /// Put the camera in BULB mode at startup.
    #[serde(default)]
    pub bulb: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_download_folder() -> PathBuf {
    PathBuf::from("/home/pi/CCCaptures/")
}

fn default_send_buffer_size() -> usize {
    1024 * 1024
}

fn default_chunk_size() -> usize {
    512
}

fn default_remote_log_level() -> String {
    "info".into()
}

fn default_status_interval_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            download_folder: default_download_folder(),
            send_buffer_size: default_send_buffer_size(),
            recv_chunk_size: default_chunk_size(),
            send_chunk_size: default_chunk_size(),
            remote_log_level: default_remote_log_level(),
            status_interval_secs: default_status_interval_secs(),
            camera: CameraConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            send_buffer_size: self.send_buffer_size,
            recv_chunk_size: self.recv_chunk_size,
            send_chunk_size: self.send_chunk_size,
        }
    }

    /// Parsed `remote_log_level` (`off`, `error`, ..., `trace`).
    pub fn remote_level(&self) -> anyhow::Result<LevelFilter> {
        self.remote_log_level
            .parse()
            .with_context(|| format!("invalid remote_log_level {:?}", self.remote_log_level))
    }

    pub fn status_interval(&self) -> Option<Duration> {
        (self.status_interval_secs > 0).then(|| Duration::from_secs(self.status_interval_secs))
    }

    /// Checks the values the link server cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.send_buffer_size > 0, "send_buffer_size must be positive");
        anyhow::ensure!(self.recv_chunk_size > 0, "recv_chunk_size must be positive");
        anyhow::ensure!(self.send_chunk_size > 0, "send_chunk_size must be positive");
        self.remote_level()?;
        Ok(())
    }
}

/// Returns the configuration file path.
fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("camctl")
        .join("controller.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8888);
        assert_eq!(config.download_folder, PathBuf::from("/home/pi/CCCaptures/"));
        assert_eq!(config.send_buffer_size, 1024 * 1024);
        assert_eq!(config.recv_chunk_size, 512);
        assert_eq!(config.send_chunk_size, 512);
        assert_eq!(config.remote_level().unwrap(), LevelFilter::INFO);
        assert_eq!(config.status_interval(), Some(Duration::from_secs(5)));
        assert!(!config.camera.bulb);
        config.validate().unwrap();
    }

    #[test]
    fn config_partial_toml() {
        let toml_str = r#"
            port = 9000
            remote_log_level = "warn"

            [camera]
            bulb = true
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.remote_level().unwrap(), LevelFilter::WARN);
        assert!(config.camera.bulb);
        assert_eq!(config.camera.capture_latency_ms, 0);
        assert_eq!(config.send_chunk_size, 512);
    }

    #[test]
    fn server_config_mirrors_fields() {
        let config = Config {
            port: 0,
            send_buffer_size: 64,
            ..Config::default()
        };
        let server = config.server_config();
        assert_eq!(server.port, 0);
        assert_eq!(server.send_buffer_size, 64);
        assert_eq!(server.recv_chunk_size, 512);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = Config {
            remote_log_level: "loud".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            send_buffer_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_disables_status() {
        let config = Config {
            status_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.status_interval(), None);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("controller.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.is_file());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn config_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("controller.toml");

        let config = Config {
            port: 7000,
            download_folder: tmp.path().join("captures"),
            camera: CameraConfig {
                capture_latency_ms: 25,
                bulb: true,
            },
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("controller.toml");
        std::fs::write(&path, "port = \"eighty\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
