// models/src/medical/appointment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppointmentError, AppointmentResult};
use crate::identifiers::{AppointmentId, DoctorId, UserId};
use crate::medical::doctor::DoctorSnapshot;
use crate::slot::{Slot, SlotDate, SlotTime};

/// Lifecycle state derived from the record flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentState {
    Created,
    Paid,
    Cancelled,
    Completed,
}

/// Payment sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    OrderCreated,
    Paid,
}

/// One patient's reservation. Records are never deleted; cancellation is a
/// state. `version` increases on every stored mutation and backs the
/// optimistic checks in the appointment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub appointment_id: AppointmentId,
    pub user_id: UserId,
    pub doctor_id: DoctorId,
    pub doctor_snapshot: DoctorSnapshot,
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
    pub amount: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled: bool,
    pub payment: bool,
    pub is_completed: bool,
    pub payment_order_ref: Option<String>,
    pub version: u64,
}

impl AppointmentRecord {
    /// Builds a fresh record in the `Created` state.
    pub fn new(
        appointment_id: AppointmentId,
        user_id: UserId,
        doctor_id: DoctorId,
        doctor_snapshot: DoctorSnapshot,
        slot: Slot,
        created_at: DateTime<Utc>,
    ) -> Self {
        let amount = doctor_snapshot.fees;
        AppointmentRecord {
            appointment_id,
            user_id,
            doctor_id,
            doctor_snapshot,
            slot_date: slot.slot_date,
            slot_time: slot.slot_time,
            amount,
            created_at,
            updated_at: created_at,
            cancelled: false,
            payment: false,
            is_completed: false,
            payment_order_ref: None,
            version: 0,
        }
    }

    pub fn slot(&self) -> Slot {
        Slot::new(self.slot_date, self.slot_time)
    }

    pub fn state(&self) -> AppointmentState {
        if self.cancelled {
            AppointmentState::Cancelled
        } else if self.is_completed {
            AppointmentState::Completed
        } else if self.payment {
            AppointmentState::Paid
        } else {
            AppointmentState::Created
        }
    }

    pub fn payment_state(&self) -> PaymentState {
        match (self.payment, &self.payment_order_ref) {
            (true, _) => PaymentState::Paid,
            (false, Some(_)) => PaymentState::OrderCreated,
            (false, None) => PaymentState::Unpaid,
        }
    }

    fn reject_terminal(&self) -> AppointmentResult<()> {
        let id = self.appointment_id.to_string();
        match self.state() {
            AppointmentState::Cancelled => Err(AppointmentError::AlreadyCancelled(id)),
            AppointmentState::Completed => Err(AppointmentError::AlreadyCompleted(id)),
            AppointmentState::Created | AppointmentState::Paid => Ok(()),
        }
    }

    /// Created|Paid -> Cancelled.
    pub fn mark_cancelled(&mut self, at: DateTime<Utc>) -> AppointmentResult<()> {
        self.reject_terminal()?;
        self.cancelled = true;
        self.updated_at = at;
        Ok(())
    }

    /// Created|Paid -> Completed.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) -> AppointmentResult<()> {
        self.reject_terminal()?;
        self.is_completed = true;
        self.updated_at = at;
        Ok(())
    }

    /// Fails unless the appointment is still waiting for payment.
    pub fn ensure_payable(&self) -> AppointmentResult<()> {
        let id = self.appointment_id.to_string();
        match self.state() {
            AppointmentState::Cancelled => Err(AppointmentError::AlreadyCancelled(id)),
            AppointmentState::Paid | AppointmentState::Completed => Err(AppointmentError::AlreadySettled(id)),
            AppointmentState::Created => Ok(()),
        }
    }

    /// Stores the order reference of a new payment attempt. Settled and
    /// cancelled appointments cannot start one.
    pub fn attach_order(&mut self, order_ref: String, at: DateTime<Utc>) -> AppointmentResult<()> {
        self.ensure_payable()?;
        self.payment_order_ref = Some(order_ref);
        self.updated_at = at;
        Ok(())
    }

    /// Created -> Paid for the given order. Returns `false` when the record
    /// was already paid through the same order, which callers treat as a
    /// successful no-op.
    pub fn mark_paid(&mut self, order_ref: &str, at: DateTime<Utc>) -> AppointmentResult<bool> {
        if self.payment_order_ref.as_deref() != Some(order_ref) {
            return Err(AppointmentError::VerificationFailed(format!(
                "order {} does not belong to appointment {}",
                order_ref, self.appointment_id
            )));
        }
        if self.payment {
            return Ok(false);
        }
        self.reject_terminal()?;
        self.payment = true;
        self.updated_at = at;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medical::doctor::Address;

    fn record() -> AppointmentRecord {
        AppointmentRecord::new(
            AppointmentId::new_v4(),
            UserId::new("patient-1").unwrap(),
            DoctorId::new("doc-1").unwrap(),
            DoctorSnapshot {
                name: "Dr. Richard James".into(),
                speciality: "General physician".into(),
                fees: 50,
                address: Address::default(),
                image: String::new(),
            },
            Slot::parse("2026-10-16", "10:00").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn should_start_created_and_unpaid() {
        let rec = record();
        assert_eq!(rec.state(), AppointmentState::Created);
        assert_eq!(rec.payment_state(), PaymentState::Unpaid);
        assert_eq!(rec.amount, 50);
    }

    #[test]
    fn should_not_cancel_twice() {
        let mut rec = record();
        rec.mark_cancelled(Utc::now()).unwrap();
        assert_eq!(rec.state(), AppointmentState::Cancelled);
        assert!(matches!(rec.mark_cancelled(Utc::now()), Err(AppointmentError::AlreadyCancelled(_))));
        assert!(matches!(rec.mark_completed(Utc::now()), Err(AppointmentError::AlreadyCancelled(_))));
    }

    #[test]
    fn should_not_cancel_completed() {
        let mut rec = record();
        rec.mark_completed(Utc::now()).unwrap();
        assert!(matches!(rec.mark_cancelled(Utc::now()), Err(AppointmentError::AlreadyCompleted(_))));
        assert!(!rec.cancelled);
    }

    #[test]
    fn should_pay_only_the_attached_order() {
        let mut rec = record();
        assert!(matches!(rec.mark_paid("order_1", Utc::now()), Err(AppointmentError::VerificationFailed(_))));
        rec.attach_order("order_1".into(), Utc::now()).unwrap();
        assert_eq!(rec.payment_state(), PaymentState::OrderCreated);
        assert!(rec.mark_paid("order_1", Utc::now()).unwrap());
        assert!(!rec.mark_paid("order_1", Utc::now()).unwrap());
        assert_eq!(rec.state(), AppointmentState::Paid);
        assert!(matches!(rec.attach_order("order_2".into(), Utc::now()), Err(AppointmentError::AlreadySettled(_))));
    }

    #[test]
    fn should_allow_cancelling_paid_appointment() {
        let mut rec = record();
        rec.attach_order("order_1".into(), Utc::now()).unwrap();
        rec.mark_paid("order_1", Utc::now()).unwrap();
        rec.mark_cancelled(Utc::now()).unwrap();
        assert_eq!(rec.state(), AppointmentState::Cancelled);
        assert!(rec.payment);
    }
}
