// lib/src/service.rs

use std::sync::Arc;

use log::debug;

use models::errors::{AppointmentError, AppointmentResult};
use models::{
    AppointmentId, AppointmentRecord, CallerIdentity, DayBucket, DoctorCalendar, DoctorId, GatewayOrder,
    PaymentConfirmation, PaymentReceipt, Slot,
};

use crate::appointments::{BookingTransaction, CancellationFlow, CompletionFlow, PaymentReconciler};
use crate::clock::Clock;
use crate::config::{PaymentConfig, ScheduleConfig};
use crate::directory::DoctorDirectory;
use crate::gateway::PaymentGateway;
use crate::scheduling::SlotCalendar;
use crate::storage_engine::{AppointmentStore, BookingLedger, StorageHandles};

/// Entry point for every appointment operation. Callers arrive with an
/// already verified `CallerIdentity`; the service never looks at tokens.
pub struct AppointmentService {
    calendar: SlotCalendar,
    directory: Arc<dyn DoctorDirectory>,
    ledger: Arc<dyn BookingLedger>,
    appointments: Arc<dyn AppointmentStore>,
    clock: Arc<dyn Clock>,
    booking: BookingTransaction,
    cancellation: CancellationFlow,
    completion: CompletionFlow,
    payments: PaymentReconciler,
}

impl AppointmentService {
    pub fn new(
        schedule: ScheduleConfig,
        payment: &PaymentConfig,
        storage: StorageHandles,
        directory: Arc<dyn DoctorDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let calendar = SlotCalendar::new(schedule);
        let StorageHandles { ledger, appointments } = storage;
        AppointmentService {
            booking: BookingTransaction::new(
                directory.clone(),
                ledger.clone(),
                appointments.clone(),
                calendar.clone(),
                clock.clone(),
            ),
            cancellation: CancellationFlow::new(ledger.clone(), appointments.clone(), clock.clone()),
            completion: CompletionFlow::new(appointments.clone(), clock.clone()),
            payments: PaymentReconciler::new(
                appointments.clone(),
                gateway,
                clock.clone(),
                payment.currency.clone(),
                payment.timeout(),
            ),
            calendar,
            directory,
            ledger,
            appointments,
            clock,
        }
    }

    /// Open slots for the doctor over the booking window, one bucket per day.
    pub async fn availability(&self, doctor_id: &DoctorId) -> AppointmentResult<Vec<DayBucket>> {
        if self.directory.get(doctor_id).await.is_none() {
            return Err(AppointmentError::DoctorNotFound(doctor_id.to_string()));
        }
        let calendar = DoctorCalendar {
            doctor_id: doctor_id.clone(),
            booked_slots: self.ledger.booked_slots(doctor_id).await?,
        };
        Ok(self.calendar.compute_availability(&calendar, self.clock.now_local()))
    }

    pub async fn book(&self, caller: &CallerIdentity, doctor_id: &DoctorId, slot: Slot) -> AppointmentResult<AppointmentRecord> {
        self.booking.book(caller, doctor_id, slot).await
    }

    pub async fn cancel(&self, caller: &CallerIdentity, appointment_id: &AppointmentId) -> AppointmentResult<AppointmentRecord> {
        self.cancellation.cancel(caller, appointment_id).await
    }

    pub async fn complete(&self, caller: &CallerIdentity, appointment_id: &AppointmentId) -> AppointmentResult<AppointmentRecord> {
        self.completion.complete(caller, appointment_id).await
    }

    pub async fn create_payment_order(
        &self,
        caller: &CallerIdentity,
        appointment_id: &AppointmentId,
    ) -> AppointmentResult<GatewayOrder> {
        self.payments.create_order(caller, appointment_id).await
    }

    pub async fn verify_payment(
        &self,
        caller: &CallerIdentity,
        confirmation: &PaymentConfirmation,
    ) -> AppointmentResult<PaymentReceipt> {
        self.payments.verify(caller, confirmation).await
    }

    /// The caller's own appointments, newest first.
    pub async fn list_my_appointments(&self, caller: &CallerIdentity) -> AppointmentResult<Vec<AppointmentRecord>> {
        let records = self.appointments.list_for_user(&caller.user_id).await?;
        debug!("Listed {} appointments for {}", records.len(), caller.user_id);
        Ok(records)
    }

    /// Appointments booked with the calling doctor, newest first.
    pub async fn list_doctor_appointments(&self, caller: &CallerIdentity) -> AppointmentResult<Vec<AppointmentRecord>> {
        let doctor_id = caller.as_doctor().ok_or(AppointmentError::Unauthenticated)?;
        self.appointments.list_for_doctor(&doctor_id).await
    }
}
