// lib/src/lib.rs

//! Appointment booking engine: slot calendar, booking ledger, appointment
//! store and the booking, cancellation, completion and payment flows,
//! behind the `AppointmentService` facade.

pub mod appointments;
pub mod clock;
pub mod config;
pub mod directory;
pub mod gateway;
pub mod scheduling;
pub mod service;
pub mod storage_engine;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PaymentConfig, PaymentProvider, ScheduleConfig, StorageConfig, StorageEngineType};
pub use directory::{DoctorDirectory, InMemoryDoctorDirectory};
pub use gateway::{create_gateway, PaymentGateway, SandboxGateway};
pub use scheduling::SlotCalendar;
pub use service::AppointmentService;
pub use storage_engine::{create_storage, StorageHandles};
