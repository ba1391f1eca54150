// models/src/identity.rs

use serde::{Deserialize, Serialize};

use crate::identifiers::{DoctorId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

/// A verified caller. Produced once at the request boundary and passed by
/// reference into every operation; nothing downstream re-derives it from
/// the request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub role: Role,
}

impl CallerIdentity {
    pub fn patient(user_id: UserId) -> Self {
        Self { user_id, role: Role::Patient }
    }

    pub fn doctor(doctor_id: &DoctorId) -> Self {
        Self { user_id: UserId(doctor_id.0.clone()), role: Role::Doctor }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self { user_id, role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The doctor this caller acts as, if any. Doctor accounts share their
    /// id with the doctor profile.
    pub fn as_doctor(&self) -> Option<DoctorId> {
        (self.role == Role::Doctor).then(|| DoctorId(self.user_id.0.clone()))
    }

    /// Owner, treating doctor, or admin.
    pub fn can_manage(&self, owner: &UserId, doctor: &DoctorId) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Doctor => self.user_id.0 == doctor.0,
            Role::Patient => &self.user_id == owner,
        }
    }
}
