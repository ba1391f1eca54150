// models/src/medical/mod.rs

pub mod appointment;
pub mod doctor;

pub use appointment::{AppointmentRecord, AppointmentState, PaymentState};
pub use doctor::{Address, Doctor, DoctorSnapshot};
