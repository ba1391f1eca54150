// lib/src/storage_engine/storage_utils.rs

use bincode::config;
use bincode::serde::{decode_from_slice, encode_to_vec};

use models::errors::{AppointmentError, AppointmentResult};
use models::{AppointmentId, AppointmentRecord, DoctorId, Slot};

/// Separates key components. Identifiers reject control characters, so a
/// NUL never appears inside a component.
const KEY_SEPARATOR: u8 = 0;

/// Serializes an appointment record with bincode.
pub fn serialize_record(record: &AppointmentRecord) -> AppointmentResult<Vec<u8>> {
    Ok(encode_to_vec(record, config::standard())?)
}

/// Deserializes an appointment record written by `serialize_record`.
pub fn deserialize_record(bytes: &[u8]) -> AppointmentResult<AppointmentRecord> {
    decode_from_slice(bytes, config::standard())
        .map(|(val, _)| val)
        .map_err(AppointmentError::from)
}

/// `doctor_id NUL` - the scan prefix for one doctor's reservations.
pub fn doctor_prefix(doctor_id: &DoctorId) -> Vec<u8> {
    let mut key = Vec::with_capacity(doctor_id.as_str().len() + 1);
    key.extend_from_slice(doctor_id.as_str().as_bytes());
    key.push(KEY_SEPARATOR);
    key
}

/// `doctor_id NUL yyyy-mm-dd NUL HH:MM`. The canonical date and time forms
/// sort lexicographically in chronological order.
pub fn reservation_key(doctor_id: &DoctorId, slot: &Slot) -> Vec<u8> {
    let mut key = doctor_prefix(doctor_id);
    key.extend_from_slice(slot.slot_date.to_string().as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(slot.slot_time.to_string().as_bytes());
    key
}

/// Recovers the slot from a reservation key produced by `reservation_key`.
pub fn parse_reservation_key(prefix_len: usize, key: &[u8]) -> AppointmentResult<Slot> {
    let corrupt = || AppointmentError::Storage(format!("corrupt reservation key {:?}", key));
    let rest = key.get(prefix_len..).ok_or_else(corrupt)?;
    let text = std::str::from_utf8(rest).map_err(|_| corrupt())?;
    let (date, time) = text.split_once('\0').ok_or_else(corrupt)?;
    Slot::parse(date, time).map_err(|_| corrupt())
}

pub fn appointment_key(id: &AppointmentId) -> [u8; 16] {
    *id.0.as_bytes()
}

pub fn appointment_id_from_key(key: &[u8]) -> AppointmentResult<AppointmentId> {
    uuid::Uuid::from_slice(key)
        .map(AppointmentId)
        .map_err(|e| AppointmentError::Storage(format!("corrupt appointment key: {}", e)))
}

/// `owner NUL appointment_uuid` - secondary index entry.
pub fn index_key(owner: &str, id: &AppointmentId) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner.len() + 17);
    key.extend_from_slice(owner.as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(id.0.as_bytes());
    key
}

/// Scan prefix for every index entry of `owner`.
pub fn index_prefix(owner: &str) -> Vec<u8> {
    let mut key = owner.as_bytes().to_vec();
    key.push(KEY_SEPARATOR);
    key
}

/// Appointment id stored in the last 16 bytes of an index key.
pub fn appointment_id_from_index_key(key: &[u8]) -> AppointmentResult<AppointmentId> {
    let start = key
        .len()
        .checked_sub(16)
        .ok_or_else(|| AppointmentError::Storage(format!("corrupt index key {:?}", key)))?;
    appointment_id_from_key(&key[start..])
}

/// Newest first, ties broken by id so listings are stable.
pub fn sort_newest_first(records: &mut [AppointmentRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.appointment_id.cmp(&a.appointment_id))
    });
}
