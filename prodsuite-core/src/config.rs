//! Global prodsuite configuration.
//!
//! Loaded from `~/.config/prodsuite/config.toml` and overlaid with
//! `PRODSUITE__SECTION__KEY` environment variables, e.g.
//! `PRODSUITE__SERVER__PORT=8080`.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SuiteError, SuiteResult};

static DEFAULT_DATABASE_PATH: &str = "~/.local/share/prodsuite/prodsuite.db";
static DEFAULT_IMAGES_DIR: &str = "~/.local/share/prodsuite/drawing-images";
static DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3333;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}

fn default_images_dir() -> PathBuf {
    PathBuf::from(DEFAULT_IMAGES_DIR)
}

fn default_vapid_subject() -> String {
    "mailto:admin@example.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_interval() -> String {
    "1m".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timezone() -> Tz {
    Tz::UTC
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed browser origin; `*` allows any.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            database_path: default_database_path(),
            images_dir: default_images_dir(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AuthConfig {
    /// OAuth client id the Google ID tokens must be issued for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_client_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PushConfig {
    /// URL-safe base64 VAPID public key handed to browsers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vapid_public_key: Option<String>,

    /// PEM file holding the VAPID private key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vapid_private_key_file: Option<PathBuf>,

    #[serde(default = "default_vapid_subject")]
    pub vapid_subject: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            vapid_public_key: None,
            vapid_private_key_file: None,
            vapid_subject: default_vapid_subject(),
        }
    }
}

impl PushConfig {
    pub fn is_configured(&self) -> bool {
        self.vapid_public_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.vapid_private_key_file.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How often due reminders are checked, in humantime format ("1m", "30s").
    #[serde(default = "default_interval")]
    pub interval: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            enabled: true,
            interval: default_interval(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SuiteConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Wall-clock zone used for recurrence math and reminder display.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        SuiteConfig {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            push: PushConfig::default(),
            scheduler: SchedulerConfig::default(),
            timezone: default_timezone(),
            log_level: default_log_level(),
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

impl SuiteConfig {
    pub fn config_path() -> SuiteResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SuiteError::Config("Could not determine config directory".into()))?
            .join("prodsuite");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented-out file on first run.
    pub fn load() -> SuiteResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> SuiteResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("PRODSUITE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SuiteError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SuiteError::Config(e.to_string()))
    }

    pub fn database_path(&self) -> PathBuf {
        expand(&self.storage.database_path)
    }

    pub fn images_dir(&self) -> PathBuf {
        expand(&self.storage.images_dir)
    }

    pub fn vapid_private_key_file(&self) -> Option<PathBuf> {
        self.push.vapid_private_key_file.as_deref().map(expand)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SuiteResult<()> {
        let contents = format!(
            "\
# prodsuite configuration

# timezone = \"UTC\"
# log_level = \"info\"

[server]
# host = \"{DEFAULT_HOST}\"
# port = {DEFAULT_PORT}
# cors_origin = \"http://localhost:5173\"

[storage]
# database_path = \"{DEFAULT_DATABASE_PATH}\"
# images_dir = \"{DEFAULT_IMAGES_DIR}\"

[auth]
# google_client_id = \"1234.apps.googleusercontent.com\"

[push]
# vapid_public_key = \"BEl6...\"
# vapid_private_key_file = \"~/.config/prodsuite/vapid.pem\"
# vapid_subject = \"mailto:admin@example.com\"

[scheduler]
# enabled = true
# interval = \"1m\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SuiteError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SuiteError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
