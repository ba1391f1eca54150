// models/src/lib.rs

//! Shared domain types for the appointment booking workspace: identifiers,
//! slot keys, doctor and appointment records, calendar views, payment
//! gateway objects and the error taxonomy.

pub mod calendar;
pub mod errors;
pub mod identifiers;
pub mod identity;
pub mod medical;
pub mod payment;
pub mod slot;

pub use calendar::{BookedSlots, CandidateSlot, DayBucket, DoctorCalendar};
pub use errors::{AppointmentError, AppointmentResult, ErrorCategory, ValidationError};
pub use identifiers::{AppointmentId, DoctorId, Identifier, UserId};
pub use identity::{CallerIdentity, Role};
pub use medical::{Address, AppointmentRecord, AppointmentState, Doctor, DoctorSnapshot, PaymentState};
pub use payment::{GatewayOrder, GatewayOrderStatus, PaymentConfirmation, PaymentReceipt};
pub use slot::{Slot, SlotDate, SlotTime};
