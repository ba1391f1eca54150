// lib/src/gateway/sandbox.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;
use uuid::Uuid;

use models::{GatewayOrder, GatewayOrderStatus};

use super::{GatewayError, PaymentGateway};

/// Gateway kept in memory for local runs and tests. With `auto_capture`
/// every order reads back as paid, as if the checkout always succeeded.
#[derive(Debug, Clone)]
pub struct SandboxGateway {
    orders: Arc<Mutex<HashMap<String, GatewayOrder>>>,
    auto_capture: bool,
    unreachable: Arc<AtomicBool>,
}

impl SandboxGateway {
    pub fn new(auto_capture: bool) -> Self {
        SandboxGateway {
            orders: Arc::new(Mutex::new(HashMap::new())),
            auto_capture,
            unreachable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Marks an order as paid. Returns false for unknown orders.
    pub async fn capture(&self, order_ref: &str) -> bool {
        match self.orders.lock().await.get_mut(order_ref) {
            Some(order) => {
                order.status = GatewayOrderStatus::Paid;
                true
            }
            None => false,
        }
    }

    /// Rewrites the amount the gateway reports for an order.
    pub async fn set_amount(&self, order_ref: &str, amount: u64) -> bool {
        match self.orders.lock().await.get_mut(order_ref) {
            Some(order) => {
                order.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Simulates an outage: every call fails with `Unreachable` until reset.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub async fn order_count(&self) -> usize {
        self.orders.lock().await.len()
    }

    fn check_reachable(&self) -> Result<(), GatewayError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unreachable("sandbox gateway is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_order(&self, amount: u64, currency: &str, receipt: &str) -> Result<GatewayOrder, GatewayError> {
        self.check_reachable()?;
        let order = GatewayOrder {
            id: format!("order_{}", Uuid::new_v4().simple()),
            amount,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
            status: GatewayOrderStatus::Created,
        };
        self.orders.lock().await.insert(order.id.clone(), order.clone());
        debug!("Sandbox order {} created for receipt {}", order.id, receipt);
        Ok(order)
    }

    async fn fetch_order_status(&self, order_ref: &str) -> Result<GatewayOrder, GatewayError> {
        self.check_reachable()?;
        let mut orders = self.orders.lock().await;
        let order = orders
            .get_mut(order_ref)
            .ok_or_else(|| GatewayError::UnknownOrder(order_ref.to_string()))?;
        if self.auto_capture {
            order.status = GatewayOrderStatus::Paid;
        }
        Ok(order.clone())
    }

    fn get_type(&self) -> &'static str {
        "Sandbox"
    }
}
