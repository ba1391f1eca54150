use serde::{Deserialize, Serialize};

use crate::identifiers::DoctorId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

/// A doctor profile as supplied by the profile service. Only the fields the
/// booking engine reads are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub speciality: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub about: String,
    /// Consultation fee in major currency units.
    pub fees: u64,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Doctor {
    pub fn snapshot(&self) -> DoctorSnapshot {
        DoctorSnapshot {
            name: self.name.clone(),
            speciality: self.speciality.clone(),
            fees: self.fees,
            address: self.address.clone(),
            image: self.image.clone(),
        }
    }
}

/// Display data copied into an appointment at booking time. Later profile
/// edits do not reach existing appointments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSnapshot {
    pub name: String,
    pub speciality: String,
    pub fees: u64,
    pub address: Address,
    pub image: String,
}
