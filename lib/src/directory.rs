// lib/src/directory.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use models::{Doctor, DoctorId};

/// Read-only lookup into the doctor catalog. The engine only needs the
/// current fee, display fields and the `available` flag at booking time.
#[async_trait]
pub trait DoctorDirectory: Send + Sync + 'static {
    async fn get(&self, doctor_id: &DoctorId) -> Option<Doctor>;
}

/// Directory backed by a map, seeded from configuration.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDoctorDirectory {
    doctors: Arc<RwLock<HashMap<DoctorId, Doctor>>>,
}

impl InMemoryDoctorDirectory {
    pub fn new(doctors: impl IntoIterator<Item = Doctor>) -> Self {
        let doctors = doctors.into_iter().map(|d| (d.id.clone(), d)).collect();
        InMemoryDoctorDirectory { doctors: Arc::new(RwLock::new(doctors)) }
    }

    /// Adds or replaces a profile.
    pub async fn upsert(&self, doctor: Doctor) {
        self.doctors.write().await.insert(doctor.id.clone(), doctor);
    }

    pub async fn len(&self) -> usize {
        self.doctors.read().await.len()
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn get(&self, doctor_id: &DoctorId) -> Option<Doctor> {
        self.doctors.read().await.get(doctor_id).cloned()
    }
}
