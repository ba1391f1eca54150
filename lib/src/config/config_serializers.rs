// lib/src/config/config_serializers.rs

use std::str::FromStr;

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

use crate::config::config_structs::{PaymentProvider, StorageEngineType};

// Some YAML front ends hand scalars over with their quotes still attached.
fn unquote(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'')
}

pub mod storage_engine_type_serde {
    use super::*;

    pub fn serialize<S>(engine_type: &StorageEngineType, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&engine_type.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<StorageEngineType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StorageEngineType::from_str(unquote(&s)).map_err(D::Error::custom)
    }
}

pub mod payment_provider_serde {
    use super::*;

    pub fn serialize<S>(provider: &PaymentProvider, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&provider.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PaymentProvider, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PaymentProvider::from_str(unquote(&s)).map_err(D::Error::custom)
    }
}
