// lib/src/appointments/cancellation.rs

use std::sync::Arc;

use log::{error, info, warn};

use models::errors::{AppointmentError, AppointmentResult};
use models::{AppointmentId, AppointmentRecord, CallerIdentity};

use crate::clock::Clock;
use crate::storage_engine::{AppointmentStore, BookingLedger};

pub struct CancellationFlow {
    ledger: Arc<dyn BookingLedger>,
    appointments: Arc<dyn AppointmentStore>,
    clock: Arc<dyn Clock>,
}

impl CancellationFlow {
    pub fn new(ledger: Arc<dyn BookingLedger>, appointments: Arc<dyn AppointmentStore>, clock: Arc<dyn Clock>) -> Self {
        CancellationFlow { ledger, appointments, clock }
    }

    /// Cancels a Created or Paid appointment and frees its slot.
    ///
    /// The record is marked cancelled before the reservation is released,
    /// so a slot is never free while a live record still claims it. A
    /// caller that neither owns nor treats the appointment gets `NotFound`.
    pub async fn cancel(&self, caller: &CallerIdentity, appointment_id: &AppointmentId) -> AppointmentResult<AppointmentRecord> {
        let record = self
            .appointments
            .get(appointment_id)
            .await?
            .filter(|r| caller.can_manage(&r.user_id, &r.doctor_id))
            .ok_or_else(|| AppointmentError::NotFound(appointment_id.to_string()))?;

        let now = self.clock.now_utc();
        let cancelled = match self.appointments.update(appointment_id, &|r| r.mark_cancelled(now)).await {
            Ok(cancelled) => cancelled,
            Err(AppointmentError::AlreadyCancelled(id)) => {
                // A previous cancel may have stopped between the two steps.
                self.release_slot(&record).await?;
                return Err(AppointmentError::AlreadyCancelled(id));
            }
            Err(e) => return Err(e),
        };

        self.release_slot(&cancelled).await?;
        info!(
            "Cancelled appointment {} (doctor {}, {}) by {}",
            appointment_id,
            cancelled.doctor_id,
            cancelled.slot(),
            caller.user_id
        );
        Ok(cancelled)
    }

    async fn release_slot(&self, record: &AppointmentRecord) -> AppointmentResult<()> {
        match self
            .ledger
            .release(&record.doctor_id, &record.slot(), &record.appointment_id)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    "Slot {} of doctor {} was no longer held by {}",
                    record.slot(),
                    record.doctor_id,
                    record.appointment_id
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "Appointment {} is cancelled but its slot {} could not be released: {}",
                    record.appointment_id,
                    record.slot(),
                    e
                );
                Err(e)
            }
        }
    }
}
