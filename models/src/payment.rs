// models/src/payment.rs

use serde::{Deserialize, Serialize};

/// Status of an order as reported by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayOrderStatus {
    Created,
    Attempted,
    Paid,
}

impl GatewayOrderStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, GatewayOrderStatus::Paid)
    }
}

/// A pending-charge object held by the gateway. `amount` is in minor
/// currency units; `receipt` carries the appointment id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: GatewayOrderStatus,
}

/// Payload the checkout widget hands back after a payment attempt. The
/// payment id and signature are forwarded as-is; the order status is always
/// re-read from the gateway before anything is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
}

/// Outcome of a verification. `newly_paid` is false for replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub appointment_id: String,
    pub order_ref: String,
    pub newly_paid: bool,
}
