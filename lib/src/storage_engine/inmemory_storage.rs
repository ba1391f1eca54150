// lib/src/storage_engine/inmemory_storage.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use models::errors::{AppointmentError, AppointmentResult};
use models::{AppointmentId, AppointmentRecord, BookedSlots, DoctorId, Slot, UserId};

use super::storage_engine::{AppointmentStore, BookingLedger, RecordMutation, ReservationOutcome};
use super::storage_utils::sort_newest_first;

/// Ledger kept in process memory. The write lock makes each reservation a
/// check-and-insert with no interleaving.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBookingLedger {
    reservations: Arc<RwLock<HashMap<DoctorId, BTreeMap<Slot, AppointmentId>>>>,
}

impl InMemoryBookingLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingLedger for InMemoryBookingLedger {
    async fn try_reserve(
        &self,
        doctor_id: &DoctorId,
        slot: &Slot,
        holder: &AppointmentId,
    ) -> AppointmentResult<ReservationOutcome> {
        let mut reservations = self.reservations.write().await;
        let slots = reservations.entry(doctor_id.clone()).or_default();
        if slots.contains_key(slot) {
            return Ok(ReservationOutcome::Conflict);
        }
        slots.insert(*slot, *holder);
        Ok(ReservationOutcome::Reserved)
    }

    async fn release(&self, doctor_id: &DoctorId, slot: &Slot, holder: &AppointmentId) -> AppointmentResult<bool> {
        let mut reservations = self.reservations.write().await;
        let Some(slots) = reservations.get_mut(doctor_id) else {
            return Ok(false);
        };
        if slots.get(slot) != Some(holder) {
            return Ok(false);
        }
        slots.remove(slot);
        Ok(true)
    }

    async fn holder_of(&self, doctor_id: &DoctorId, slot: &Slot) -> AppointmentResult<Option<AppointmentId>> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(doctor_id).and_then(|slots| slots.get(slot)).copied())
    }

    async fn booked_slots(&self, doctor_id: &DoctorId) -> AppointmentResult<BookedSlots> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .get(doctor_id)
            .map(|slots| slots.keys().copied().collect())
            .unwrap_or_default())
    }

    fn get_type(&self) -> &'static str {
        "InMemory"
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryAppointmentStore {
    records: Arc<RwLock<HashMap<AppointmentId, AppointmentRecord>>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, keep: F) -> Vec<AppointmentRecord>
    where
        F: Fn(&AppointmentRecord) -> bool,
    {
        let records = self.records.read().await;
        let mut matching: Vec<AppointmentRecord> = records.values().filter(|r| keep(r)).cloned().collect();
        sort_newest_first(&mut matching);
        matching
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, record: &AppointmentRecord) -> AppointmentResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.appointment_id) {
            return Err(AppointmentError::Storage(format!(
                "appointment {} already exists",
                record.appointment_id
            )));
        }
        records.insert(record.appointment_id, record.clone());
        Ok(())
    }

    async fn get(&self, id: &AppointmentId) -> AppointmentResult<Option<AppointmentRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update(
        &self,
        id: &AppointmentId,
        mutate: &RecordMutation<'_>,
    ) -> AppointmentResult<AppointmentRecord> {
        let mut records = self.records.write().await;
        let current = records
            .get(id)
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))?;
        let mut next = current.clone();
        mutate(&mut next)?;
        next.version = current.version + 1;
        records.insert(*id, next.clone());
        Ok(next)
    }

    async fn find_by_order_ref(&self, order_ref: &str) -> AppointmentResult<Option<AppointmentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.payment_order_ref.as_deref() == Some(order_ref))
            .cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> AppointmentResult<Vec<AppointmentRecord>> {
        Ok(self.select(|r| &r.user_id == user_id).await)
    }

    async fn list_for_doctor(&self, doctor_id: &DoctorId) -> AppointmentResult<Vec<AppointmentRecord>> {
        Ok(self.select(|r| &r.doctor_id == doctor_id).await)
    }

    fn get_type(&self) -> &'static str {
        "InMemory"
    }
}
