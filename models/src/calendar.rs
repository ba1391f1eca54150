// models/src/calendar.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::identifiers::DoctorId;
use crate::slot::{Slot, SlotDate, SlotTime};

/// Read-only view of a doctor's reserved slots, keyed by date. Derived from
/// the booking ledger; never mutated directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSlots(BTreeMap<SlotDate, BTreeSet<SlotTime>>);

impl BookedSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: Slot) -> bool {
        self.0.entry(slot.slot_date).or_default().insert(slot.slot_time)
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.0
            .get(&slot.slot_date)
            .is_some_and(|times| times.contains(&slot.slot_time))
    }

    pub fn times_on(&self, date: &SlotDate) -> impl Iterator<Item = &SlotTime> {
        self.0.get(date).into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }
}

impl FromIterator<Slot> for BookedSlots {
    fn from_iter<I: IntoIterator<Item = Slot>>(iter: I) -> Self {
        let mut booked = BookedSlots::new();
        for slot in iter {
            booked.insert(slot);
        }
        booked
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorCalendar {
    pub doctor_id: DoctorId,
    pub booked_slots: BookedSlots,
}

/// A slot offered to a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSlot {
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
    pub starts_at: NaiveDateTime,
}

impl From<Slot> for CandidateSlot {
    fn from(slot: Slot) -> Self {
        CandidateSlot {
            slot_date: slot.slot_date,
            slot_time: slot.slot_time,
            starts_at: slot.starts_at(),
        }
    }
}

impl CandidateSlot {
    pub fn slot(&self) -> Slot {
        Slot::new(self.slot_date, self.slot_time)
    }
}

/// Candidate slots of one calendar day, in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: SlotDate,
    pub weekday: String,
    pub slots: Vec<CandidateSlot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_group_slots_by_date() {
        let booked: BookedSlots = [
            Slot::parse("2026-10-16", "10:00").unwrap(),
            Slot::parse("2026-10-16", "10:30").unwrap(),
            Slot::parse("2026-10-17", "10:00").unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(booked.len(), 3);
        assert!(booked.contains(&Slot::parse("16_10_2026", "10:30 AM").unwrap()));
        assert!(!booked.contains(&Slot::parse("2026-10-17", "10:30").unwrap()));
        let day: Vec<String> = booked
            .times_on(&SlotDate::parse("2026-10-16").unwrap())
            .map(ToString::to_string)
            .collect();
        assert_eq!(day, vec!["10:00", "10:30"]);
    }
}
