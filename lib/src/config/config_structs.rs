// lib/src/config/config_structs.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::config::config_defaults::*;
use crate::config::config_serializers::{payment_provider_serde, storage_engine_type_serde};

/// Working-hours grid the slot calendar generates candidates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_open_hour")]
    pub open_hour: u32,
    #[serde(default = "default_close_hour")]
    pub close_hour: u32,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            open_hour: DEFAULT_OPEN_HOUR,
            close_hour: DEFAULT_CLOSE_HOUR,
            slot_minutes: DEFAULT_SLOT_MINUTES,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.slot_minutes == 0 || 60 % self.slot_minutes != 0 {
            anyhow::bail!("slot_minutes must divide an hour, got {}", self.slot_minutes);
        }
        if self.open_hour >= self.close_hour || self.close_hour > 24 {
            anyhow::bail!(
                "invalid working hours {}..{}",
                self.open_hour,
                self.close_hour
            );
        }
        if self.window_days == 0 {
            anyhow::bail!("window_days must be at least 1");
        }
        Ok(())
    }

    pub fn opens_at(&self) -> u32 {
        self.open_hour * 60
    }

    /// Exclusive end of the last slot, in minutes since midnight.
    pub fn closes_at(&self) -> u32 {
        self.close_hour * 60
    }

    pub fn time_at(&self, minute_of_day: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(minute_of_day / 60, minute_of_day % 60, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEngineType {
    Sled,
    InMemory,
}

impl fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageEngineType::Sled => write!(f, "sled"),
            StorageEngineType::InMemory => write!(f, "inmemory"),
        }
    }
}

impl FromStr for StorageEngineType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageEngineType::Sled),
            "inmemory" | "in_memory" | "memory" => Ok(StorageEngineType::InMemory),
            _ => Err(anyhow::anyhow!("Unknown storage engine type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_engine_type", with = "storage_engine_type_serde")]
    pub engine_type: StorageEngineType,
    #[serde(default = "default_data_directory")]
    pub data_directory: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            engine_type: default_storage_engine_type(),
            data_directory: default_data_directory(),
        }
    }
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        StorageConfig { engine_type: StorageEngineType::InMemory, data_directory: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Razorpay,
    Sandbox,
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentProvider::Razorpay => write!(f, "razorpay"),
            PaymentProvider::Sandbox => write!(f, "sandbox"),
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "razorpay" => Ok(PaymentProvider::Razorpay),
            "sandbox" => Ok(PaymentProvider::Sandbox),
            _ => Err(anyhow::anyhow!("Unknown payment provider: {}", s)),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_payment_provider", with = "payment_provider_serde")]
    pub provider: PaymentProvider,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_razorpay_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default)]
    pub key_secret: Option<String>,
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
}

// Keeps key_secret out of Debug output.
impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("provider", &self.provider)
            .field("currency", &self.currency)
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        PaymentConfig {
            provider: default_payment_provider(),
            currency: default_currency(),
            base_url: default_razorpay_base_url(),
            key_id: None,
            key_secret: None,
            timeout_secs: default_gateway_timeout_secs(),
        }
    }
}

impl PaymentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_ten_until_nine() {
        let cfg = ScheduleConfig::default();
        assert_eq!(cfg.opens_at(), 600);
        assert_eq!(cfg.closes_at(), 21 * 60);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn should_reject_grid_that_does_not_divide_an_hour() {
        let cfg = ScheduleConfig { slot_minutes: 25, ..ScheduleConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = ScheduleConfig { open_hour: 21, close_hour: 10, ..ScheduleConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn should_parse_engine_and_provider_names() {
        assert_eq!("Sled".parse::<StorageEngineType>().unwrap(), StorageEngineType::Sled);
        assert_eq!("inmemory".parse::<StorageEngineType>().unwrap(), StorageEngineType::InMemory);
        assert!("rocksdb".parse::<StorageEngineType>().is_err());
        assert_eq!("RAZORPAY".parse::<PaymentProvider>().unwrap(), PaymentProvider::Razorpay);
    }

    #[test]
    fn should_hide_key_secret_in_debug_output() {
        let cfg = PaymentConfig { key_secret: Some("s3cr3t".into()), ..PaymentConfig::default() };
        assert!(!format!("{:?}", cfg).contains("s3cr3t"));
    }
}
