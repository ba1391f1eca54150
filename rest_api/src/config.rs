// rest_api/src/config.rs

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

use appointment_engine::config::{PaymentConfig, ScheduleConfig, StorageConfig, StorageEngineType};
use models::Doctor;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8082;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60 * 24;
pub const CONFIG_FILE_NAME: &str = "appointments_config.yaml";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

/// Represents the configuration for the REST API server itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { host: default_host(), port: default_port() }
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig { jwt_secret: None, token_ttl_secs: default_token_ttl_secs() }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

/// Everything the server needs, mirroring the sections of
/// `appointments_config.yaml`. Missing sections take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub doctors: Vec<Doctor>,
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml2::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))
    }

    /// Applies `JWT_SECRET_KEY`, `RAZORPAY_KEY_ID`, `RAZORPAY_KEY_SECRET`
    /// and `PORT` from `lookup` on top of the file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("JWT_SECRET_KEY") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(key_id) = lookup("RAZORPAY_KEY_ID") {
            self.payment.key_id = Some(key_id);
        }
        if let Some(key_secret) = lookup("RAZORPAY_KEY_SECRET") {
            self.payment.key_secret = Some(key_secret);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule.validate().context("Invalid schedule section")?;
        if self.storage.engine_type == StorageEngineType::Sled && self.storage.data_directory.is_none() {
            anyhow::bail!("storage.data_directory is required for the sled engine");
        }
        if self.auth.jwt_secret.is_none() {
            anyhow::bail!("auth.jwt_secret (or JWT_SECRET_KEY) must be set");
        }
        Ok(())
    }
}

/// Resolves the config path: explicit argument, then `APPOINTMENTS_CONFIG`,
/// then `appointments_config.yaml` next to this crate.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os("APPOINTMENTS_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(CONFIG_FILE_NAME))
}

/// Loads, overrides from the environment and validates the configuration.
pub fn load_config(explicit: Option<PathBuf>) -> Result<AppConfig> {
    let path = config_path(explicit);
    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        AppConfig::from_yaml(&content).with_context(|| format!("Failed to load {}", path.display()))?
    } else {
        warn!("Config file {} not found, using defaults", path.display());
        AppConfig::default()
    };
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    info!(
        "Loaded configuration: storage={:?}, payment={:?}, {} doctors",
        config.storage.engine_type,
        config.payment.provider,
        config.doctors.len()
    );
    Ok(config)
}
