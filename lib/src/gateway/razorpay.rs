// lib/src/gateway/razorpay.rs

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::Serialize;

use models::GatewayOrder;

use super::{GatewayError, PaymentGateway};

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay orders API over HTTPS with basic auth.
#[derive(Clone)]
pub struct RazorpayGateway {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl std::fmt::Debug for RazorpayGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayGateway")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl RazorpayGateway {
    pub fn new(base_url: &str, key_id: String, key_secret: String, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unreachable(format!("failed to build HTTP client: {}", e)))?;
        Ok(RazorpayGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        })
    }

    async fn read_order(response: Response, order_ref: Option<&str>) -> Result<GatewayOrder, GatewayError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(order_ref) = order_ref {
                return Err(GatewayError::UnknownOrder(order_ref.to_string()));
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Razorpay responded {}: {}", status, body);
            return Err(GatewayError::Rejected { status: status.as_u16(), body });
        }
        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Unreachable(format!("request timed out: {}", err))
    } else {
        GatewayError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, amount: u64, currency: &str, receipt: &str) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/orders", self.base_url);
        debug!("Creating Razorpay order for receipt {} ({} {})", receipt, amount, currency);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderRequest { amount, currency, receipt })
            .send()
            .await
            .map_err(transport_error)?;
        Self::read_order(response, None).await
    }

    async fn fetch_order_status(&self, order_ref: &str) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/orders/{}", self.base_url, order_ref);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(transport_error)?;
        Self::read_order(response, Some(order_ref)).await
    }

    fn get_type(&self) -> &'static str {
        "Razorpay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use models::GatewayOrderStatus;
    use serde_json::{json, Value};

    async fn create(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if !headers.contains_key("authorization") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "auth"})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "id": "order_test_1",
                "entity": "order",
                "amount": body["amount"],
                "currency": body["currency"],
                "receipt": body["receipt"],
                "status": "created",
            })),
        )
    }

    async fn fetch(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
        if id != "order_test_1" {
            return (StatusCode::NOT_FOUND, Json(json!({"error": {"code": "BAD_REQUEST_ERROR"}})));
        }
        (
            StatusCode::OK,
            Json(json!({"id": id, "amount": 50000, "currency": "INR", "receipt": "appt", "status": "paid"})),
        )
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/v1/orders", post(create))
            .route("/v1/orders/:id", get(fetch));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}/v1/", addr)
    }

    fn gateway(base_url: &str) -> RazorpayGateway {
        RazorpayGateway::new(base_url, "rzp_test".into(), "secret".into(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn should_create_and_fetch_orders() {
        let base = serve().await;
        let gateway = gateway(&base);

        let order = gateway.create_order(50000, "INR", "appt").await.unwrap();
        assert_eq!(order.id, "order_test_1");
        assert_eq!(order.amount, 50000);
        assert_eq!(order.receipt.as_deref(), Some("appt"));
        assert_eq!(order.status, GatewayOrderStatus::Created);

        let fetched = gateway.fetch_order_status("order_test_1").await.unwrap();
        assert!(fetched.status.is_paid());
    }

    #[tokio::test]
    async fn should_report_unknown_orders() {
        let base = serve().await;
        let err = gateway(&base).fetch_order_status("order_missing").await.unwrap_err();
        assert_eq!(err, GatewayError::UnknownOrder("order_missing".into()));
    }

    #[tokio::test]
    async fn should_report_unreachable_gateway() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = gateway(&format!("http://{}/v1", addr))
            .create_order(100, "INR", "appt")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unreachable(_)));
    }
}
