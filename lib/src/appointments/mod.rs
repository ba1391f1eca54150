// lib/src/appointments/mod.rs

//! Appointment lifecycle flows. Each flow owns one kind of state change:
//! booking creates a record and its reservation, cancellation and
//! completion end it, and the payment reconciler moves it to paid.

pub mod booking;
pub mod cancellation;
pub mod completion;
pub mod payment;

pub use booking::BookingTransaction;
pub use cancellation::CancellationFlow;
pub use completion::CompletionFlow;
pub use payment::PaymentReconciler;
