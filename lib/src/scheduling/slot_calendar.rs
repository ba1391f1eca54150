// lib/src/scheduling/slot_calendar.rs

//! Candidate slot generation over the rolling booking window.
//!
//! The calendar works on a snapshot of the doctor's booked slots and never
//! takes a lock. A slot it offers can be taken a moment later; the ledger
//! settles that race at reservation time.

use chrono::{Duration, NaiveDateTime, Timelike};
use log::debug;

use models::{AppointmentError, AppointmentResult, CandidateSlot, DayBucket, DoctorCalendar, Slot, SlotDate, SlotTime};

use crate::config::ScheduleConfig;

#[derive(Debug, Clone, Default)]
pub struct SlotCalendar {
    schedule: ScheduleConfig,
}

impl SlotCalendar {
    pub fn new(schedule: ScheduleConfig) -> Self {
        SlotCalendar { schedule }
    }

    /// First grid boundary strictly after `now`, in minutes since midnight.
    fn next_boundary_after(&self, now: NaiveDateTime) -> u32 {
        let step = self.schedule.slot_minutes;
        let minute_of_day = now.hour() * 60 + now.minute();
        (minute_of_day / step) * step + step
    }

    /// Returns one bucket per day of the window, starting with `now`'s date.
    /// Booked slots and slots that are not strictly after `now` are left out.
    pub fn compute_availability(&self, calendar: &DoctorCalendar, now: NaiveDateTime) -> Vec<DayBucket> {
        let today = now.date();
        let step = self.schedule.slot_minutes;
        let close = self.schedule.closes_at();

        let buckets: Vec<DayBucket> = (0..self.schedule.window_days)
            .map(|offset| {
                let date = today + Duration::days(i64::from(offset));
                let slot_date = SlotDate::new(date);
                let day_start = if offset == 0 {
                    self.next_boundary_after(now).max(self.schedule.opens_at())
                } else {
                    self.schedule.opens_at()
                };

                let slots = (day_start..close)
                    .step_by(step as usize)
                    .filter_map(|minute| self.schedule.time_at(minute))
                    .map(|time| Slot::new(slot_date, SlotTime::new(time)))
                    .filter(|slot| !calendar.booked_slots.contains(slot))
                    .map(CandidateSlot::from)
                    .collect();

                DayBucket {
                    date: slot_date,
                    weekday: date.format("%a").to_string().to_uppercase(),
                    slots,
                }
            })
            .collect();

        debug!(
            "computed availability for doctor {}: {} open slots over {} days",
            calendar.doctor_id,
            buckets.iter().map(|b| b.slots.len()).sum::<usize>(),
            buckets.len()
        );
        buckets
    }

    /// Checks that `slot` is one the calendar could have offered at `now`,
    /// ignoring bookings: on the grid, inside working hours, in the future
    /// and inside the booking window.
    pub fn validate_slot(&self, slot: &Slot, now: NaiveDateTime) -> AppointmentResult<()> {
        let minute = slot.slot_time.minute_of_day();
        let invalid = |reason: &str| Err(AppointmentError::InvalidSlot(format!("{}: {}", slot, reason)));

        if slot.slot_time.time().second() != 0 || minute % self.schedule.slot_minutes != 0 {
            return invalid("not on the slot grid");
        }
        if minute < self.schedule.opens_at() || minute >= self.schedule.closes_at() {
            return invalid("outside working hours");
        }
        if slot.starts_at() <= now {
            return invalid("slot is in the past");
        }
        let last_day = now.date() + Duration::days(i64::from(self.schedule.window_days) - 1);
        if slot.slot_date.date() > last_day {
            return invalid("slot is beyond the booking window");
        }
        Ok(())
    }
}
