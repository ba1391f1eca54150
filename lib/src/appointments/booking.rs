// lib/src/appointments/booking.rs

use std::sync::Arc;

use log::{error, info, warn};

use models::errors::{AppointmentError, AppointmentResult};
use models::{AppointmentId, AppointmentRecord, CallerIdentity, DoctorId, Slot};

use crate::clock::Clock;
use crate::directory::DoctorDirectory;
use crate::scheduling::SlotCalendar;
use crate::storage_engine::{AppointmentStore, BookingLedger, ReservationOutcome};

/// Turns a slot pick into a reservation plus an appointment record. The
/// reservation is taken first; a record is only written once the slot is
/// held, and a failed write gives the slot back.
pub struct BookingTransaction {
    directory: Arc<dyn DoctorDirectory>,
    ledger: Arc<dyn BookingLedger>,
    appointments: Arc<dyn AppointmentStore>,
    calendar: SlotCalendar,
    clock: Arc<dyn Clock>,
}

impl BookingTransaction {
    pub fn new(
        directory: Arc<dyn DoctorDirectory>,
        ledger: Arc<dyn BookingLedger>,
        appointments: Arc<dyn AppointmentStore>,
        calendar: SlotCalendar,
        clock: Arc<dyn Clock>,
    ) -> Self {
        BookingTransaction { directory, ledger, appointments, calendar, clock }
    }

    pub async fn book(
        &self,
        caller: &CallerIdentity,
        doctor_id: &DoctorId,
        slot: Slot,
    ) -> AppointmentResult<AppointmentRecord> {
        let doctor = self
            .directory
            .get(doctor_id)
            .await
            .ok_or_else(|| AppointmentError::DoctorNotFound(doctor_id.to_string()))?;
        if !doctor.available {
            return Err(AppointmentError::DoctorUnavailable(doctor_id.to_string()));
        }
        self.calendar.validate_slot(&slot, self.clock.now_local())?;

        let appointment_id = AppointmentId::new_v4();
        if self.ledger.try_reserve(doctor_id, &slot, &appointment_id).await? == ReservationOutcome::Conflict {
            info!("Slot {} of doctor {} already taken, rejecting booking by {}", slot, doctor_id, caller.user_id);
            return Err(AppointmentError::SlotTaken {
                date: slot.slot_date.to_string(),
                time: slot.slot_time.to_string(),
            });
        }

        let record = AppointmentRecord::new(
            appointment_id,
            caller.user_id.clone(),
            doctor_id.clone(),
            doctor.snapshot(),
            slot,
            self.clock.now_utc(),
        );
        if let Err(e) = self.appointments.insert(&record).await {
            warn!("Failed to store appointment {}, releasing slot {}: {}", appointment_id, slot, e);
            if let Err(release_err) = self.ledger.release(doctor_id, &slot, &appointment_id).await {
                error!(
                    "Rollback of reservation {} for doctor {} failed: {}",
                    slot, doctor_id, release_err
                );
            }
            return Err(e);
        }

        info!(
            "Booked appointment {} with doctor {} at {} for {}",
            appointment_id, doctor_id, slot, caller.user_id
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::test_support::{patient, slot, Fixture};
    use crate::storage_engine::RecordMutation;
    use async_trait::async_trait;
    use models::{AppointmentState, UserId};

    fn booking(fx: &Fixture) -> BookingTransaction {
        BookingTransaction::new(
            fx.directory.clone(),
            fx.ledger.clone(),
            fx.appointments.clone(),
            SlotCalendar::default(),
            fx.clock.clone(),
        )
    }

    #[tokio::test]
    async fn should_book_and_snapshot_doctor() {
        let fx = Fixture::new();
        let doctor = DoctorId::new("doc-1").unwrap();
        let record = booking(&fx)
            .book(&patient("user-1"), &doctor, slot("2026-10-16", "10:00"))
            .await
            .unwrap();

        assert_eq!(record.state(), AppointmentState::Created);
        assert_eq!(record.amount, 50);
        assert_eq!(record.doctor_snapshot.name, "Dr. doc-1");
        assert_eq!(record.user_id, UserId::new("user-1").unwrap());
        assert_eq!(
            fx.ledger.holder_of(&doctor, &record.slot()).await.unwrap(),
            Some(record.appointment_id)
        );
        assert!(fx.appointments.get(&record.appointment_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn should_reject_taken_slot_without_creating_record() {
        let fx = Fixture::new();
        let flow = booking(&fx);
        let doctor = DoctorId::new("doc-1").unwrap();
        flow.book(&patient("user-1"), &doctor, slot("2026-10-17", "12:00")).await.unwrap();

        let err = flow
            .book(&patient("user-2"), &doctor, slot("17-10-2026", "12:00 PM"))
            .await
            .unwrap_err();
        assert_eq!(err, AppointmentError::SlotTaken { date: "2026-10-17".into(), time: "12:00".into() });
        assert!(fx.appointments.list_for_user(&UserId::new("user-2").unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_unknown_or_unavailable_doctor() {
        let fx = Fixture::new();
        let flow = booking(&fx);
        let err = flow
            .book(&patient("user-1"), &DoctorId::new("doc-404").unwrap(), slot("2026-10-17", "12:00"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "doctor_not_found");

        let off = DoctorId::new("doc-off").unwrap();
        let err = flow.book(&patient("user-1"), &off, slot("2026-10-17", "12:00")).await.unwrap_err();
        assert_eq!(err.kind(), "doctor_unavailable");
        assert!(fx.ledger.booked_slots(&off).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_slots_the_calendar_would_not_offer() {
        let fx = Fixture::new();
        let flow = booking(&fx);
        let doctor = DoctorId::new("doc-1").unwrap();
        for (date, time) in [("2026-10-16", "08:30"), ("2026-10-16", "10:10"), ("2026-10-30", "10:00")] {
            let err = flow.book(&patient("user-1"), &doctor, slot(date, time)).await.unwrap_err();
            assert_eq!(err.kind(), "invalid_slot", "{date} {time}");
        }
        assert!(fx.ledger.booked_slots(&doctor).await.unwrap().is_empty());
    }

    struct FailingStore;

    #[async_trait]
    impl AppointmentStore for FailingStore {
        async fn insert(&self, _record: &AppointmentRecord) -> AppointmentResult<()> {
            Err(AppointmentError::Storage("disk full".into()))
        }
        async fn get(&self, _id: &AppointmentId) -> AppointmentResult<Option<AppointmentRecord>> {
            Ok(None)
        }
        async fn update(
            &self,
            id: &AppointmentId,
            _mutate: &RecordMutation<'_>,
        ) -> AppointmentResult<AppointmentRecord> {
            Err(AppointmentError::NotFound(id.to_string()))
        }
        async fn find_by_order_ref(&self, _order_ref: &str) -> AppointmentResult<Option<AppointmentRecord>> {
            Ok(None)
        }
        async fn list_for_user(&self, _user_id: &UserId) -> AppointmentResult<Vec<AppointmentRecord>> {
            Ok(Vec::new())
        }
        async fn list_for_doctor(&self, _doctor_id: &DoctorId) -> AppointmentResult<Vec<AppointmentRecord>> {
            Ok(Vec::new())
        }
        fn get_type(&self) -> &'static str {
            "Failing"
        }
    }

    #[tokio::test]
    async fn should_release_reservation_when_record_write_fails() {
        let fx = Fixture::new();
        let flow = BookingTransaction::new(
            fx.directory.clone(),
            fx.ledger.clone(),
            Arc::new(FailingStore),
            SlotCalendar::default(),
            fx.clock.clone(),
        );
        let doctor = DoctorId::new("doc-1").unwrap();
        let err = flow.book(&patient("user-1"), &doctor, slot("2026-10-17", "15:00")).await.unwrap_err();
        assert_eq!(err.kind(), "storage_error");
        assert!(fx.ledger.booked_slots(&doctor).await.unwrap().is_empty());
    }
}
