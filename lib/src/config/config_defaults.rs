// lib/src/config/config_defaults.rs

use std::path::PathBuf;

use crate::config::config_structs::{PaymentProvider, StorageEngineType};

pub const DEFAULT_DATA_DIRECTORY: &str = "/tmp/appointments_data";
pub const DEFAULT_OPEN_HOUR: u32 = 10;
pub const DEFAULT_CLOSE_HOUR: u32 = 21;
pub const DEFAULT_SLOT_MINUTES: u32 = 30;
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_RAZORPAY_BASE_URL: &str = "https://api.razorpay.com/v1";
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;

pub fn default_open_hour() -> u32 { DEFAULT_OPEN_HOUR }
pub fn default_close_hour() -> u32 { DEFAULT_CLOSE_HOUR }
pub fn default_slot_minutes() -> u32 { DEFAULT_SLOT_MINUTES }
pub fn default_window_days() -> u32 { DEFAULT_WINDOW_DAYS }
pub fn default_storage_engine_type() -> StorageEngineType { StorageEngineType::Sled }
pub fn default_data_directory() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_DATA_DIRECTORY))
}
pub fn default_payment_provider() -> PaymentProvider { PaymentProvider::Sandbox }
pub fn default_currency() -> String { DEFAULT_CURRENCY.to_string() }
pub fn default_razorpay_base_url() -> String { DEFAULT_RAZORPAY_BASE_URL.to_string() }
pub fn default_gateway_timeout_secs() -> u64 { DEFAULT_GATEWAY_TIMEOUT_SECS }
