// lib/src/appointments/completion.rs

use std::sync::Arc;

use log::info;

use models::errors::{AppointmentError, AppointmentResult};
use models::{AppointmentId, AppointmentRecord, CallerIdentity};

use crate::clock::Clock;
use crate::storage_engine::AppointmentStore;

/// Doctor-side "mark as done". The slot stays reserved: a completed visit
/// still occupied it.
pub struct CompletionFlow {
    appointments: Arc<dyn AppointmentStore>,
    clock: Arc<dyn Clock>,
}

impl CompletionFlow {
    pub fn new(appointments: Arc<dyn AppointmentStore>, clock: Arc<dyn Clock>) -> Self {
        CompletionFlow { appointments, clock }
    }

    /// Only the treating doctor or an admin may complete an appointment.
    pub async fn complete(&self, caller: &CallerIdentity, appointment_id: &AppointmentId) -> AppointmentResult<AppointmentRecord> {
        let allowed = |record: &AppointmentRecord| {
            caller.is_admin() || caller.as_doctor().as_ref() == Some(&record.doctor_id)
        };
        self.appointments
            .get(appointment_id)
            .await?
            .filter(|r| allowed(r))
            .ok_or_else(|| AppointmentError::NotFound(appointment_id.to_string()))?;

        let now = self.clock.now_utc();
        let completed = self
            .appointments
            .update(appointment_id, &|r| r.mark_completed(now))
            .await?;
        info!(
            "Completed appointment {} (doctor {}) by {}",
            appointment_id, completed.doctor_id, caller.user_id
        );
        Ok(completed)
    }
}
