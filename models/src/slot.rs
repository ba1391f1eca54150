// models/src/slot.rs

//! Slot keys. A slot is a (calendar date, time-of-day) pair. Both halves
//! have exactly one canonical textual form, `yyyy-mm-dd` and 24-hour
//! `HH:MM`, used for storage keys and every response. Older clients send
//! `d-m-yyyy`, `d_m_yyyy` or `hh:mm AM` forms; those are accepted on input
//! and normalized here, so nothing past the parser ever sees them.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";
const CANONICAL_TIME_FORMAT: &str = "%H:%M";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotDate(NaiveDate);

impl SlotDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Parses any accepted date form.
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let trimmed = input.trim();
        let invalid = || ValidationError::InvalidDateFormat(input.to_string());

        let parts: Vec<&str> = trimmed.split(|c| c == '-' || c == '_').collect();
        let [a, b, c] = parts.as_slice() else {
            return Err(invalid());
        };
        let numbers = [a, b, c]
            .iter()
            .map(|p| {
                if p.is_empty() || !p.chars().all(|ch| ch.is_ascii_digit()) {
                    Err(invalid())
                } else {
                    p.parse::<u32>().map_err(|_| invalid())
                }
            })
            .collect::<ValidationResult<Vec<u32>>>()?;

        let (year, month, day) = if a.len() == 4 {
            (numbers[0], numbers[1], numbers[2])
        } else if c.len() == 4 {
            (numbers[2], numbers[1], numbers[0])
        } else {
            return Err(invalid());
        };

        let year = i32::try_from(year).map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for SlotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_DATE_FORMAT))
    }
}

impl FromStr for SlotDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SlotDate {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        Self::parse(&value)
    }
}

impl From<SlotDate> for String {
    fn from(value: SlotDate) -> Self {
        value.to_string()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// Minutes since midnight.
    pub fn minute_of_day(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    /// Parses `HH:MM` (24-hour) or `hh:mm AM|PM`.
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let invalid = || ValidationError::InvalidTimeFormat(input.to_string());
        let normalized = input.trim().to_ascii_uppercase();

        let (clock, meridiem) = if let Some(rest) = normalized.strip_suffix("AM") {
            (rest.trim_end(), Some(false))
        } else if let Some(rest) = normalized.strip_suffix("PM") {
            (rest.trim_end(), Some(true))
        } else {
            (normalized.as_str(), None)
        };

        let (h, m) = clock.split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;

        let hour = match meridiem {
            None => hour,
            Some(_) if hour == 0 || hour > 12 => return Err(invalid()),
            Some(false) => hour % 12,
            Some(true) => hour % 12 + 12,
        };

        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_TIME_FORMAT))
    }
}

impl FromStr for SlotTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SlotTime {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        Self::parse(&value)
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.to_string()
    }
}

/// A reservable (date, time) pair.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
}

impl Slot {
    pub fn new(slot_date: SlotDate, slot_time: SlotTime) -> Self {
        Self { slot_date, slot_time }
    }

    pub fn parse(date: &str, time: &str) -> ValidationResult<Self> {
        Ok(Self::new(SlotDate::parse(date)?, SlotTime::parse(time)?))
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.slot_date.date().and_time(self.slot_time.time())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.slot_date, self.slot_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_every_date_form() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        for input in ["2026-03-07", "7-3-2026", "07_03_2026", " 7_3_2026 "] {
            assert_eq!(SlotDate::parse(input).unwrap().date(), expected, "{input}");
        }
    }

    #[test]
    fn should_render_dates_canonically() {
        let date = SlotDate::parse("7_3_2026").unwrap();
        assert_eq!(date.to_string(), "2026-03-07");
    }

    #[test]
    fn should_reject_malformed_dates() {
        for input in ["", "2026-13-01", "31-2-2026", "2026/03/07", "7-3-26", "a-b-cdef", "2026-03-07-01"] {
            assert!(SlotDate::parse(input).is_err(), "{input}");
        }
    }

    #[test]
    fn should_parse_twelve_hour_times() {
        assert_eq!(SlotTime::parse("10:30 AM").unwrap().to_string(), "10:30");
        assert_eq!(SlotTime::parse("12:00 pm").unwrap().to_string(), "12:00");
        assert_eq!(SlotTime::parse("12:30 AM").unwrap().to_string(), "00:30");
        assert_eq!(SlotTime::parse("08:30PM").unwrap().to_string(), "20:30");
        assert!(SlotTime::parse("13:00 PM").is_err());
    }

    #[test]
    fn should_parse_twenty_four_hour_times() {
        assert_eq!(SlotTime::parse("9:00").unwrap().to_string(), "09:00");
        assert_eq!(SlotTime::parse("20:30").unwrap().minute_of_day(), 20 * 60 + 30);
        for input in ["24:00", "10:5", "10-30", "", "ten"] {
            assert!(SlotTime::parse(input).is_err(), "{input}");
        }
    }

    #[test]
    fn should_serialize_slot_with_canonical_keys() {
        let slot = Slot::parse("16_10_2026", "10:00 AM").unwrap();
        let json = serde_json::to_value(slot).unwrap();
        assert_eq!(json, serde_json::json!({ "slotDate": "2026-10-16", "slotTime": "10:00" }));
    }
}
