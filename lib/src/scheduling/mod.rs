// lib/src/scheduling/mod.rs

pub mod slot_calendar;

pub use slot_calendar::SlotCalendar;
