// lib/src/appointments/payment.rs

//! Payment reconciliation: `Unpaid -> OrderCreated -> Paid`.
//!
//! Confirmations arrive at least once and carry nothing the engine trusts
//! on its own. Verification always re-reads the order from the gateway and
//! compares it to the stored appointment before flipping `payment`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use models::errors::{AppointmentError, AppointmentResult};
use models::{AppointmentId, AppointmentRecord, CallerIdentity, GatewayOrder, PaymentConfirmation, PaymentReceipt};

use crate::clock::Clock;
use crate::gateway::{GatewayError, PaymentGateway};
use crate::storage_engine::AppointmentStore;

/// Gateways count money in the currency's minor unit.
const MINOR_UNITS_PER_MAJOR: u64 = 100;

pub struct PaymentReconciler {
    appointments: Arc<dyn AppointmentStore>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    currency: String,
    timeout: Duration,
}

impl PaymentReconciler {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        currency: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        PaymentReconciler { appointments, gateway, clock, currency: currency.into(), timeout }
    }

    async fn call_gateway<T, F>(&self, request: F) -> AppointmentResult<T>
    where
        F: Future<Output = Result<T, GatewayError>> + Send,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("Payment gateway call failed: {}", e);
                Err(e.into())
            }
            Err(_) => {
                warn!("Payment gateway did not answer within {:?}", self.timeout);
                Err(AppointmentError::GatewayUnavailable(format!(
                    "no answer within {:?}",
                    self.timeout
                )))
            }
        }
    }

    fn minor_amount(record: &AppointmentRecord) -> AppointmentResult<u64> {
        record.amount.checked_mul(MINOR_UNITS_PER_MAJOR).ok_or_else(|| {
            AppointmentError::Internal(format!("amount of appointment {} overflows", record.appointment_id))
        })
    }

    /// Opens a gateway order for the appointment's amount and remembers its
    /// reference. A second call on an unpaid appointment replaces the
    /// reference; the earlier order can no longer settle it.
    pub async fn create_order(&self, caller: &CallerIdentity, appointment_id: &AppointmentId) -> AppointmentResult<GatewayOrder> {
        let record = self
            .appointments
            .get(appointment_id)
            .await?
            .filter(|r| caller.can_manage(&r.user_id, &r.doctor_id))
            .ok_or_else(|| AppointmentError::NotFound(appointment_id.to_string()))?;
        record.ensure_payable()?;

        let amount = Self::minor_amount(&record)?;
        let receipt = appointment_id.to_string();
        let order = self
            .call_gateway(self.gateway.create_order(amount, &self.currency, &receipt))
            .await?;

        let now = self.clock.now_utc();
        let order_ref = order.id.clone();
        if let Err(e) = self
            .appointments
            .update(appointment_id, &|r| r.attach_order(order_ref.clone(), now))
            .await
        {
            warn!("Gateway order {} left unused, appointment {} changed: {}", order.id, appointment_id, e);
            return Err(e);
        }

        info!("Created payment order {} for appointment {} ({} {})", order.id, appointment_id, amount, self.currency);
        Ok(order)
    }

    /// Confirms a payment reported by the checkout widget. Replays of an
    /// already-applied confirmation succeed without calling the gateway.
    pub async fn verify(&self, caller: &CallerIdentity, confirmation: &PaymentConfirmation) -> AppointmentResult<PaymentReceipt> {
        let order_ref = confirmation.razorpay_order_id.as_str();
        let unknown = || AppointmentError::VerificationFailed(format!("order {} is not linked to an appointment", order_ref));
        let record = self
            .appointments
            .find_by_order_ref(order_ref)
            .await?
            .filter(|r| caller.can_manage(&r.user_id, &r.doctor_id))
            .ok_or_else(unknown)?;
        let appointment_id = record.appointment_id;

        if record.payment && record.payment_order_ref.as_deref() == Some(order_ref) {
            info!("Payment for appointment {} already applied (order {})", appointment_id, order_ref);
            return Ok(Self::receipt(&record, order_ref, false));
        }
        if record.cancelled {
            return Err(AppointmentError::AlreadyCancelled(appointment_id.to_string()));
        }

        let order = self.call_gateway(self.gateway.fetch_order_status(order_ref)).await?;
        self.check_order(&record, &order)?;

        let now = self.clock.now_utc();
        let newly_paid = AtomicBool::new(false);
        let updated = self
            .appointments
            .update(&appointment_id, &|r| {
                let changed = r.mark_paid(order_ref, now)?;
                newly_paid.store(changed, Ordering::SeqCst);
                Ok(())
            })
            .await?;

        let newly_paid = newly_paid.load(Ordering::SeqCst);
        if newly_paid {
            info!("Payment verified for appointment {} (order {})", appointment_id, order_ref);
        }
        Ok(Self::receipt(&updated, order_ref, newly_paid))
    }

    fn check_order(&self, record: &AppointmentRecord, order: &GatewayOrder) -> AppointmentResult<()> {
        let mismatch = |what: String| {
            warn!("Rejecting payment for appointment {}: {}", record.appointment_id, what);
            Err(AppointmentError::VerificationFailed(what))
        };

        if !order.status.is_paid() {
            return mismatch(format!("order {} is {:?}, not paid", order.id, order.status));
        }
        let expected = Self::minor_amount(record)?;
        if order.amount != expected {
            return mismatch(format!("order {} is for {}, expected {}", order.id, order.amount, expected));
        }
        if !order.currency.eq_ignore_ascii_case(&self.currency) {
            return mismatch(format!("order {} is in {}, expected {}", order.id, order.currency, self.currency));
        }
        let receipt = record.appointment_id.to_string();
        if order.receipt.as_deref() != Some(receipt.as_str()) {
            return mismatch(format!("order {} was not opened for appointment {}", order.id, receipt));
        }
        Ok(())
    }

    fn receipt(record: &AppointmentRecord, order_ref: &str, newly_paid: bool) -> PaymentReceipt {
        PaymentReceipt {
            appointment_id: record.appointment_id.to_string(),
            order_ref: order_ref.to_string(),
            newly_paid,
        }
    }
}
