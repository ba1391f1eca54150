// lib/src/storage_engine/storage_engine.rs

use async_trait::async_trait;

use models::errors::AppointmentResult;
use models::{AppointmentId, AppointmentRecord, BookedSlots, DoctorId, Slot, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    Reserved,
    Conflict,
}

/// Authoritative record of reserved (doctor, date, time) keys. Each key is
/// a row with a uniqueness constraint: reserving is one constrained insert,
/// so two concurrent reservations of the same key can never both succeed.
#[async_trait]
pub trait BookingLedger: Send + Sync + 'static {
    /// Inserts the reservation unless the key is already held.
    async fn try_reserve(
        &self,
        doctor_id: &DoctorId,
        slot: &Slot,
        holder: &AppointmentId,
    ) -> AppointmentResult<ReservationOutcome>;

    /// Removes the reservation if `holder` still owns it and reports whether
    /// a row was removed. Releasing a free slot, or one now held by another
    /// appointment, is a no-op.
    async fn release(&self, doctor_id: &DoctorId, slot: &Slot, holder: &AppointmentId) -> AppointmentResult<bool>;

    /// Appointment currently holding the slot, if any.
    async fn holder_of(&self, doctor_id: &DoctorId, slot: &Slot) -> AppointmentResult<Option<AppointmentId>>;

    /// Snapshot of the doctor's reserved slots, the `bookedSlots` view.
    async fn booked_slots(&self, doctor_id: &DoctorId) -> AppointmentResult<BookedSlots>;

    fn get_type(&self) -> &'static str;
}

/// A change applied to the latest stored version of a record.
pub type RecordMutation<'a> = dyn for<'r> Fn(&'r mut AppointmentRecord) -> AppointmentResult<()> + Send + Sync + 'a;

/// Durable collection of appointment records. Records are never removed.
#[async_trait]
pub trait AppointmentStore: Send + Sync + 'static {
    /// Stores a new record. Fails if the id is already present.
    async fn insert(&self, record: &AppointmentRecord) -> AppointmentResult<()>;

    async fn get(&self, id: &AppointmentId) -> AppointmentResult<Option<AppointmentRecord>>;

    /// Applies `mutate` to the current version of the record and stores the
    /// result with `version + 1`. Updates of one record are serialized: the
    /// closure always sees the latest stored state, and an `Err` from it
    /// leaves the record untouched.
    async fn update(
        &self,
        id: &AppointmentId,
        mutate: &RecordMutation<'_>,
    ) -> AppointmentResult<AppointmentRecord>;

    async fn find_by_order_ref(&self, order_ref: &str) -> AppointmentResult<Option<AppointmentRecord>>;

    /// Newest first.
    async fn list_for_user(&self, user_id: &UserId) -> AppointmentResult<Vec<AppointmentRecord>>;

    /// Newest first.
    async fn list_for_doctor(&self, doctor_id: &DoctorId) -> AppointmentResult<Vec<AppointmentRecord>>;

    fn get_type(&self) -> &'static str;
}
