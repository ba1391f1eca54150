// lib/src/gateway/mod.rs

//! Payment gateway adapters. The engine talks to the gateway through two
//! calls only: create an order and read an order back. Everything the
//! checkout widget reports is re-checked against `fetch_order_status`.

pub mod razorpay;
pub mod sandbox;

pub use razorpay::RazorpayGateway;
pub use sandbox::SandboxGateway;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use thiserror::Error;

use models::errors::AppointmentError;
use models::GatewayOrder;

use crate::config::{PaymentConfig, PaymentProvider};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Unreachable(String),
    #[error("gateway returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("gateway order {0} does not exist")]
    UnknownOrder(String),
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

impl From<GatewayError> for AppointmentError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::UnknownOrder(order) => {
                AppointmentError::VerificationFailed(format!("gateway has no order {}", order))
            }
            GatewayError::Rejected { status, body } if (400..500).contains(&status) && status != 429 => {
                AppointmentError::Internal(format!("gateway refused the request ({}): {}", status, body))
            }
            other => AppointmentError::GatewayUnavailable(other.to_string()),
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Opens a pending charge of `amount` minor units.
    async fn create_order(&self, amount: u64, currency: &str, receipt: &str) -> Result<GatewayOrder, GatewayError>;

    /// Reads the order back from the gateway, including its current status.
    async fn fetch_order_status(&self, order_ref: &str) -> Result<GatewayOrder, GatewayError>;

    fn get_type(&self) -> &'static str;
}

/// Builds the gateway named by `config.provider`.
pub fn create_gateway(config: &PaymentConfig) -> Result<Arc<dyn PaymentGateway>> {
    let gateway: Arc<dyn PaymentGateway> = match config.provider {
        PaymentProvider::Razorpay => {
            let key_id = config.key_id.clone().context("razorpay provider requires payment.key_id")?;
            let key_secret = config
                .key_secret
                .clone()
                .context("razorpay provider requires payment.key_secret")?;
            Arc::new(RazorpayGateway::new(&config.base_url, key_id, key_secret, config.timeout())?)
        }
        PaymentProvider::Sandbox => Arc::new(SandboxGateway::new(true)),
    };
    info!("Payment gateway ready: {} ({})", gateway.get_type(), config.currency);
    Ok(gateway)
}
