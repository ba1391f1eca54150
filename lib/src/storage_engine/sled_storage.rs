// lib/src/storage_engine/sled_storage.rs

use std::path::Path;

use async_trait::async_trait;
use log::{debug, error, info};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};

use models::errors::{AppointmentError, AppointmentResult};
use models::{AppointmentId, AppointmentRecord, BookedSlots, DoctorId, Slot, UserId};

use super::storage_engine::{AppointmentStore, BookingLedger, RecordMutation, ReservationOutcome};
use super::storage_utils::{
    appointment_id_from_index_key, appointment_id_from_key, appointment_key, deserialize_record,
    doctor_prefix, index_key, index_prefix, parse_reservation_key, reservation_key,
    serialize_record, sort_newest_first,
};

const RESERVATIONS_TREE: &str = "reservations";
const APPOINTMENTS_TREE: &str = "appointments";
const BY_USER_TREE: &str = "appointments_by_user";
const BY_DOCTOR_TREE: &str = "appointments_by_doctor";
const BY_ORDER_TREE: &str = "appointments_by_order";

/// Opens (or creates) the sled database under `path`.
pub fn open_sled_db(path: &Path) -> AppointmentResult<Db> {
    std::fs::create_dir_all(path).map_err(|e| {
        error!("Failed to create database directory at {:?}: {}", path, e);
        AppointmentError::Storage(format!("Failed to create database directory at {:?}: {}", path, e))
    })?;
    let db = sled::Config::new().path(path).open().map_err(|e| {
        error!("Failed to open Sled database at {:?}: {}", path, e);
        AppointmentError::Storage(format!("Failed to open Sled database at {:?}: {}", path, e))
    })?;
    info!("Opened Sled database at {:?}", path);
    Ok(db)
}

fn unwrap_transaction(err: TransactionError<AppointmentError>) -> AppointmentError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => e.into(),
    }
}

fn abort(err: AppointmentError) -> ConflictableTransactionError<AppointmentError> {
    ConflictableTransactionError::Abort(err)
}

/// Reservation rows live in one tree keyed by `doctor NUL date NUL time`
/// with the holding appointment id as value. A reservation is a
/// compare-and-swap from "absent", which sled applies atomically.
#[derive(Debug, Clone)]
pub struct SledBookingLedger {
    tree: Tree,
}

impl SledBookingLedger {
    pub fn new(db: &Db) -> AppointmentResult<Self> {
        Ok(SledBookingLedger { tree: db.open_tree(RESERVATIONS_TREE)? })
    }
}

#[async_trait]
impl BookingLedger for SledBookingLedger {
    async fn try_reserve(
        &self,
        doctor_id: &DoctorId,
        slot: &Slot,
        holder: &AppointmentId,
    ) -> AppointmentResult<ReservationOutcome> {
        let key = reservation_key(doctor_id, slot);
        let holder_key = appointment_key(holder);
        let swapped = self
            .tree
            .compare_and_swap(&key, None as Option<&[u8]>, Some(&holder_key[..]))?;
        match swapped {
            Ok(()) => {
                self.tree.flush_async().await?;
                debug!("Reserved {} for doctor {} (holder {})", slot, doctor_id, holder);
                Ok(ReservationOutcome::Reserved)
            }
            Err(_) => Ok(ReservationOutcome::Conflict),
        }
    }

    async fn release(&self, doctor_id: &DoctorId, slot: &Slot, holder: &AppointmentId) -> AppointmentResult<bool> {
        let holder_key = appointment_key(holder);
        let swapped = self.tree.compare_and_swap(
            reservation_key(doctor_id, slot),
            Some(&holder_key[..]),
            None as Option<&[u8]>,
        )?;
        if swapped.is_err() {
            return Ok(false);
        }
        self.tree.flush_async().await?;
        debug!("Released {} for doctor {} (holder {})", slot, doctor_id, holder);
        Ok(true)
    }

    async fn holder_of(&self, doctor_id: &DoctorId, slot: &Slot) -> AppointmentResult<Option<AppointmentId>> {
        self.tree
            .get(reservation_key(doctor_id, slot))?
            .map(|value| appointment_id_from_key(&value))
            .transpose()
    }

    async fn booked_slots(&self, doctor_id: &DoctorId) -> AppointmentResult<BookedSlots> {
        let prefix = doctor_prefix(doctor_id);
        let mut booked = BookedSlots::new();
        for entry in self.tree.scan_prefix(&prefix) {
            let (key, _) = entry?;
            booked.insert(parse_reservation_key(prefix.len(), &key)?);
        }
        Ok(booked)
    }

    fn get_type(&self) -> &'static str {
        "Sled"
    }
}

/// Appointment records keyed by id, with secondary index trees for user,
/// doctor and gateway order reference. Every write touches the record and
/// its index entries in a single sled transaction.
#[derive(Debug, Clone)]
pub struct SledAppointmentStore {
    records: Tree,
    by_user: Tree,
    by_doctor: Tree,
    by_order: Tree,
}

impl SledAppointmentStore {
    pub fn new(db: &Db) -> AppointmentResult<Self> {
        Ok(SledAppointmentStore {
            records: db.open_tree(APPOINTMENTS_TREE)?,
            by_user: db.open_tree(BY_USER_TREE)?,
            by_doctor: db.open_tree(BY_DOCTOR_TREE)?,
            by_order: db.open_tree(BY_ORDER_TREE)?,
        })
    }

    fn list_indexed(&self, index: &Tree, owner: &str) -> AppointmentResult<Vec<AppointmentRecord>> {
        let mut records = Vec::new();
        for entry in index.scan_prefix(index_prefix(owner)) {
            let (key, _) = entry?;
            let id = appointment_id_from_index_key(&key)?;
            match self.records.get(appointment_key(&id))? {
                Some(bytes) => records.push(deserialize_record(&bytes)?),
                None => error!("Index entry for {} points at missing appointment {}", owner, id),
            }
        }
        sort_newest_first(&mut records);
        Ok(records)
    }
}

#[async_trait]
impl AppointmentStore for SledAppointmentStore {
    async fn insert(&self, record: &AppointmentRecord) -> AppointmentResult<()> {
        let key = appointment_key(&record.appointment_id);
        let bytes = serialize_record(record)?;
        let user_key = index_key(record.user_id.as_str(), &record.appointment_id);
        let doctor_key = index_key(record.doctor_id.as_str(), &record.appointment_id);

        (&self.records, &self.by_user, &self.by_doctor)
            .transaction(|(records, by_user, by_doctor)| {
                if records.get(&key[..])?.is_some() {
                    return Err(abort(AppointmentError::Storage(format!(
                        "appointment {} already exists",
                        record.appointment_id
                    ))));
                }
                records.insert(&key[..], bytes.as_slice())?;
                by_user.insert(user_key.as_slice(), &[] as &[u8])?;
                by_doctor.insert(doctor_key.as_slice(), &[] as &[u8])?;
                Ok(())
            })
            .map_err(unwrap_transaction)?;

        self.records.flush_async().await?;
        debug!("Stored appointment {}", record.appointment_id);
        Ok(())
    }

    async fn get(&self, id: &AppointmentId) -> AppointmentResult<Option<AppointmentRecord>> {
        self.records
            .get(appointment_key(id))?
            .map(|bytes| deserialize_record(&bytes))
            .transpose()
    }

    async fn update(
        &self,
        id: &AppointmentId,
        mutate: &RecordMutation<'_>,
    ) -> AppointmentResult<AppointmentRecord> {
        let key = appointment_key(id);

        let updated = (&self.records, &self.by_order)
            .transaction(|(records, by_order)| {
                let bytes = records
                    .get(&key[..])?
                    .ok_or_else(|| abort(AppointmentError::NotFound(id.to_string())))?;
                let current = deserialize_record(&bytes).map_err(abort)?;
                let mut next = current.clone();
                mutate(&mut next).map_err(abort)?;
                next.version = current.version + 1;

                if current.payment_order_ref != next.payment_order_ref {
                    if let Some(old) = &current.payment_order_ref {
                        by_order.remove(old.as_bytes())?;
                    }
                    if let Some(new) = &next.payment_order_ref {
                        by_order.insert(new.as_bytes(), &key[..])?;
                    }
                }
                records.insert(&key[..], serialize_record(&next).map_err(abort)?)?;
                Ok(next)
            })
            .map_err(unwrap_transaction)?;

        self.records.flush_async().await?;
        debug!("Updated appointment {} to version {}", id, updated.version);
        Ok(updated)
    }

    async fn find_by_order_ref(&self, order_ref: &str) -> AppointmentResult<Option<AppointmentRecord>> {
        let Some(key) = self.by_order.get(order_ref.as_bytes())? else {
            return Ok(None);
        };
        let id = appointment_id_from_key(&key)?;
        self.get(&id).await
    }

    async fn list_for_user(&self, user_id: &UserId) -> AppointmentResult<Vec<AppointmentRecord>> {
        self.list_indexed(&self.by_user, user_id.as_str())
    }

    async fn list_for_doctor(&self, doctor_id: &DoctorId) -> AppointmentResult<Vec<AppointmentRecord>> {
        self.list_indexed(&self.by_doctor, doctor_id.as_str())
    }

    fn get_type(&self) -> &'static str {
        "Sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use models::DoctorSnapshot;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open() -> (TempDir, Db) {
        let dir = TempDir::new().unwrap();
        let db = open_sled_db(dir.path()).unwrap();
        (dir, db)
    }

    fn record(user: &str, doctor: &str, minute: u32) -> AppointmentRecord {
        let created = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
            .and_utc();
        let snapshot = DoctorSnapshot {
            name: "Dr. Rao".into(),
            speciality: "General physician".into(),
            fees: 500,
            address: Default::default(),
            image: String::new(),
        };
        AppointmentRecord::new(
            AppointmentId::new_v4(),
            UserId::new(user).unwrap(),
            DoctorId::new(doctor).unwrap(),
            snapshot,
            Slot::parse("2026-10-17", "10:00").unwrap(),
            created,
        )
    }

    #[tokio::test]
    async fn should_reject_second_reservation_of_same_key() {
        let (_dir, db) = open();
        let ledger = SledBookingLedger::new(&db).unwrap();
        let doctor = DoctorId::new("doc-1").unwrap();
        let slot = Slot::parse("2026-10-17", "10:00").unwrap();
        let (first, second) = (AppointmentId::new_v4(), AppointmentId::new_v4());

        assert_eq!(ledger.try_reserve(&doctor, &slot, &first).await.unwrap(), ReservationOutcome::Reserved);
        assert_eq!(ledger.try_reserve(&doctor, &slot, &second).await.unwrap(), ReservationOutcome::Conflict);
        assert_eq!(ledger.holder_of(&doctor, &slot).await.unwrap(), Some(first));

        assert!(!ledger.release(&doctor, &slot, &second).await.unwrap());
        assert!(ledger.release(&doctor, &slot, &first).await.unwrap());
        assert!(!ledger.release(&doctor, &slot, &first).await.unwrap());
        assert_eq!(ledger.try_reserve(&doctor, &slot, &second).await.unwrap(), ReservationOutcome::Reserved);
    }

    #[tokio::test]
    async fn should_grant_a_contended_slot_exactly_once() {
        let (_dir, db) = open();
        let ledger = Arc::new(SledBookingLedger::new(&db).unwrap());
        let doctor = DoctorId::new("doc-1").unwrap();
        let slot = Slot::parse("2026-10-17", "14:30").unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                let doctor = doctor.clone();
                tokio::spawn(async move { ledger.try_reserve(&doctor, &slot, &AppointmentId::new_v4()).await.unwrap() })
            })
            .collect();

        let mut reserved = 0;
        for task in tasks {
            if task.await.unwrap() == ReservationOutcome::Reserved {
                reserved += 1;
            }
        }
        assert_eq!(reserved, 1);
        assert_eq!(ledger.booked_slots(&doctor).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_scope_booked_slots_to_one_doctor() {
        let (_dir, db) = open();
        let ledger = SledBookingLedger::new(&db).unwrap();
        let slot = Slot::parse("2026-10-17", "10:00").unwrap();
        let doc1 = DoctorId::new("doc-1").unwrap();
        let doc10 = DoctorId::new("doc-10").unwrap();
        ledger.try_reserve(&doc10, &slot, &AppointmentId::new_v4()).await.unwrap();

        assert!(ledger.booked_slots(&doc1).await.unwrap().is_empty());
        assert!(ledger.booked_slots(&doc10).await.unwrap().contains(&slot));
    }

    #[tokio::test]
    async fn should_persist_records_and_indexes() {
        let (dir, db) = open();
        let older = record("user-1", "doc-1", 0);
        let newer = record("user-1", "doc-2", 5);
        {
            let store = SledAppointmentStore::new(&db).unwrap();
            store.insert(&older).await.unwrap();
            store.insert(&newer).await.unwrap();
            assert!(store.insert(&older).await.is_err());
        }
        drop(db);

        let db = open_sled_db(dir.path()).unwrap();
        let store = SledAppointmentStore::new(&db).unwrap();
        let mine = store.list_for_user(&UserId::new("user-1").unwrap()).await.unwrap();
        assert_eq!(
            mine.iter().map(|r| r.appointment_id).collect::<Vec<_>>(),
            vec![newer.appointment_id, older.appointment_id]
        );
        let doc2 = store.list_for_doctor(&DoctorId::new("doc-2").unwrap()).await.unwrap();
        assert_eq!(doc2.len(), 1);
        assert_eq!(doc2[0].appointment_id, newer.appointment_id);
    }

    #[tokio::test]
    async fn should_bump_version_and_track_order_ref() {
        let (_dir, db) = open();
        let store = SledAppointmentStore::new(&db).unwrap();
        let rec = record("user-1", "doc-1", 0);
        store.insert(&rec).await.unwrap();
        let at = rec.created_at;

        let updated = store
            .update(&rec.appointment_id, &|r| r.attach_order("order_A".into(), at))
            .await
            .unwrap();
        assert_eq!(updated.version, rec.version + 1);
        assert_eq!(
            store.find_by_order_ref("order_A").await.unwrap().map(|r| r.appointment_id),
            Some(rec.appointment_id)
        );

        store
            .update(&rec.appointment_id, &|r| r.attach_order("order_B".into(), at))
            .await
            .unwrap();
        assert!(store.find_by_order_ref("order_A").await.unwrap().is_none());
        assert!(store.find_by_order_ref("order_B").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn should_leave_record_untouched_when_mutation_fails() {
        let (_dir, db) = open();
        let store = SledAppointmentStore::new(&db).unwrap();
        let rec = record("user-1", "doc-1", 0);
        store.insert(&rec).await.unwrap();
        let at = rec.created_at;

        store.update(&rec.appointment_id, &|r| r.mark_cancelled(at)).await.unwrap();
        let err = store
            .update(&rec.appointment_id, &|r| r.mark_completed(at))
            .await
            .unwrap_err();
        assert_eq!(err, AppointmentError::AlreadyCancelled(rec.appointment_id.to_string()));

        let stored = store.get(&rec.appointment_id).await.unwrap().unwrap();
        assert!(stored.cancelled);
        assert!(!stored.is_completed);
        assert_eq!(stored.version, rec.version + 1);

        let missing = store.update(&AppointmentId::new_v4(), &|_| Ok(())).await.unwrap_err();
        assert_eq!(missing.kind(), "not_found");
    }
}
