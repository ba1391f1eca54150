// rest_api/src/lib.rs

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Error as AnyhowError};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Path, State},
    http::{request::Parts, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};

use appointment_engine::{
    create_gateway, create_storage, AppointmentService, InMemoryDoctorDirectory, SystemClock,
};
use models::{
    AppointmentError, AppointmentId, AppointmentRecord, AppointmentState, CallerIdentity, DoctorId, ErrorCategory,
    PaymentConfirmation, Slot,
};
use security::{extract_token, AuthError, TokenAuthority};

pub mod config;
use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum RestApiError {
    #[error(transparent)]
    Appointment(#[from] AppointmentError),
    #[error("authentication failed: {0}")]
    Unauthenticated(#[from] AuthError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<JsonRejection> for RestApiError {
    fn from(rejection: JsonRejection) -> Self {
        RestApiError::InvalidInput(rejection.body_text())
    }
}

fn status_for(err: &AppointmentError) -> StatusCode {
    match err {
        AppointmentError::DoctorNotFound(_) | AppointmentError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => match err.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::ExternalDependency => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::Authorization => StatusCode::UNAUTHORIZED,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let (status, kind, message, retryable) = match self {
            RestApiError::Appointment(err) => {
                let status = status_for(&err);
                let message = if err.category() == ErrorCategory::Internal {
                    error!("Request failed: {}", err);
                    "internal error".to_string()
                } else {
                    err.to_string()
                };
                (status, err.kind(), message, err.is_retryable())
            }
            RestApiError::Unauthenticated(err) => {
                debug!("Rejected caller: {}", err);
                (StatusCode::UNAUTHORIZED, "unauthenticated", "unauthenticated".to_string(), false)
            }
            RestApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg, false),
        };

        let body = Json(json!({
            "status": "error",
            "kind": kind,
            "message": message,
            "retryable": retryable,
        }));

        (status, body).into_response()
    }
}

// Shared state for the Axum application
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppointmentService>,
    pub tokens: Arc<TokenAuthority>,
}

/// The verified identity of the caller, taken from `Authorization: Bearer`
/// or the legacy `token` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller(pub CallerIdentity);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedCaller {
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        let token = extract_token(header("authorization"), header("token"))?;
        Ok(AuthenticatedCaller(state.tokens.verify(token)?))
    }
}

/// An appointment as returned to clients: the stored record plus its
/// derived lifecycle state.
#[derive(Debug, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub record: AppointmentRecord,
    pub state: AppointmentState,
}

impl From<AppointmentRecord> for AppointmentView {
    fn from(record: AppointmentRecord) -> Self {
        let state = record.state();
        AppointmentView { record, state }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[serde(alias = "docId")]
    pub doctor_id: String,
    pub slot_date: String,
    pub slot_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderRequest {
    pub appointment_id: String,
}

fn parse_doctor_id(raw: &str) -> Result<DoctorId, RestApiError> {
    raw.parse()
        .map_err(|_| AppointmentError::DoctorNotFound(raw.to_string()).into())
}

fn parse_appointment_id(raw: &str) -> Result<AppointmentId, RestApiError> {
    raw.parse()
        .map_err(|_| AppointmentError::NotFound(raw.to_string()).into())
}

async fn health_check_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok", "message": "REST API is healthy"})))
}

async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"version": env!("CARGO_PKG_VERSION")})))
}

async fn availability_handler(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
) -> Result<impl IntoResponse, RestApiError> {
    let doctor_id = parse_doctor_id(&doctor_id)?;
    let days = state.service.availability(&doctor_id).await?;
    Ok(Json(json!({"status": "success", "doctorId": doctor_id, "days": days})))
}

async fn book_handler(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RestApiError> {
    let Json(request) = payload?;
    let doctor_id = parse_doctor_id(&request.doctor_id)?;
    let slot = Slot::parse(&request.slot_date, &request.slot_time).map_err(AppointmentError::from)?;
    let record = state.service.book(&caller, &doctor_id, slot).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Appointment booked",
            "appointment": AppointmentView::from(record),
        })),
    ))
}

async fn list_my_appointments_handler(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> Result<impl IntoResponse, RestApiError> {
    let appointments: Vec<AppointmentView> = state
        .service
        .list_my_appointments(&caller)
        .await?
        .into_iter()
        .map(AppointmentView::from)
        .collect();
    Ok(Json(json!({"status": "success", "appointments": appointments})))
}

async fn list_doctor_appointments_handler(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> Result<impl IntoResponse, RestApiError> {
    let appointments: Vec<AppointmentView> = state
        .service
        .list_doctor_appointments(&caller)
        .await?
        .into_iter()
        .map(AppointmentView::from)
        .collect();
    Ok(Json(json!({"status": "success", "appointments": appointments})))
}

async fn cancel_handler(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(appointment_id): Path<String>,
) -> Result<impl IntoResponse, RestApiError> {
    let appointment_id = parse_appointment_id(&appointment_id)?;
    let record = state.service.cancel(&caller, &appointment_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Appointment cancelled",
        "appointment": AppointmentView::from(record),
    })))
}

async fn complete_handler(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(appointment_id): Path<String>,
) -> Result<impl IntoResponse, RestApiError> {
    let appointment_id = parse_appointment_id(&appointment_id)?;
    let record = state.service.complete(&caller, &appointment_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Appointment completed",
        "appointment": AppointmentView::from(record),
    })))
}

async fn create_order_handler(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<PaymentOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RestApiError> {
    let Json(request) = payload?;
    let appointment_id = parse_appointment_id(&request.appointment_id)?;
    let order = state.service.create_payment_order(&caller, &appointment_id).await?;
    Ok(Json(json!({"status": "success", "order": order})))
}

async fn verify_payment_handler(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    payload: Result<Json<PaymentConfirmation>, JsonRejection>,
) -> Result<impl IntoResponse, RestApiError> {
    let Json(confirmation) = payload?;
    let receipt = state.service.verify_payment(&caller, &confirmation).await?;
    let message = if receipt.newly_paid { "Payment verified" } else { "Payment already recorded" };
    Ok(Json(json!({"status": "success", "message": message, "receipt": receipt})))
}

pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/v1/health", get(health_check_handler))
        .route("/api/v1/version", get(version_handler))
        .route("/api/v1/doctors/:doctor_id/availability", get(availability_handler))
        .route(
            "/api/v1/appointments",
            post(book_handler).get(list_my_appointments_handler),
        )
        .route("/api/v1/appointments/:appointment_id/cancel", post(cancel_handler))
        .route("/api/v1/appointments/:appointment_id/complete", post(complete_handler))
        .route("/api/v1/doctor/appointments", get(list_doctor_appointments_handler))
        .route("/api/v1/payments/orders", post(create_order_handler))
        .route("/api/v1/payments/verify", post(verify_payment_handler))
        .with_state(app_state)
        .layer(cors)
}

/// Wires storage, gateway, doctor directory and token authority from the
/// loaded configuration.
pub fn build_state(config: &AppConfig) -> Result<AppState, AnyhowError> {
    let secret = config
        .auth
        .jwt_secret
        .as_deref()
        .context("auth.jwt_secret is not set")?;
    let tokens = TokenAuthority::new(secret, config.auth.token_ttl_secs).context("Invalid JWT secret")?;
    let gateway = create_gateway(&config.payment).context("Failed to set up payment gateway")?;
    let storage = create_storage(&config.storage).context("Failed to open storage")?;
    let directory = Arc::new(InMemoryDoctorDirectory::new(config.doctors.clone()));

    let service = AppointmentService::new(
        config.schedule.clone(),
        &config.payment,
        storage,
        directory,
        gateway,
        Arc::new(SystemClock),
    );
    Ok(AppState { service: Arc::new(service), tokens: Arc::new(tokens) })
}

/// Fires `shutdown_tx` once `signal` resolves. If the signal cannot be
/// listened for, the sender is kept alive so the server keeps running.
pub async fn forward_shutdown_signal<F>(signal: F, shutdown_tx: oneshot::Sender<()>)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!("Failed to listen for shutdown signal, the server will only stop when killed: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}

pub async fn start_server(config: AppConfig, shutdown_rx: oneshot::Receiver<()>) -> Result<(), AnyhowError> {
    let app_state = build_state(&config)?;
    let app = build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!("REST API server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
            info!("Received shutdown signal.");
        })
        .await
        .context("REST API server failed")?;

    info!("REST API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: RestApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn should_map_error_categories_to_status_codes() {
        let cases = [
            (AppointmentError::SlotTaken { date: "2026-10-17".into(), time: "10:00".into() }, StatusCode::CONFLICT),
            (AppointmentError::DoctorNotFound("d".into()), StatusCode::NOT_FOUND),
            (AppointmentError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (AppointmentError::InvalidSlot("x".into()), StatusCode::BAD_REQUEST),
            (AppointmentError::GatewayUnavailable("timeout".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppointmentError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppointmentError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "{}", err.kind());
        }
    }

    #[tokio::test]
    async fn should_render_error_body_with_kind_and_retryable() {
        let (status, body) = body_of(AppointmentError::GatewayUnavailable("timeout".into()).into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "gateway_unavailable");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn should_hide_internal_and_auth_details() {
        let (_, body) = body_of(AppointmentError::Storage("/var/lib/secret path".into()).into()).await;
        assert_eq!(body["message"], "internal error");

        let (status, body) = body_of(AuthError::InvalidToken("ExpiredSignature".into()).into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthenticated");
        assert_eq!(body["message"], "unauthenticated");
    }

    #[tokio::test]
    async fn should_build_state_from_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.data_directory = Some(dir.path().to_path_buf());
        assert!(build_state(&config).is_err());

        config.auth.jwt_secret = Some("state-builder-secret-long-enough-for-hs256".into());
        config.doctors = AppConfig::from_yaml(include_str!("../appointments_config.yaml")).unwrap().doctors;
        let state = build_state(&config).unwrap();
        let days = state.service.availability(&"doc1".parse().unwrap()).await.unwrap();
        assert_eq!(days.len(), config.schedule.window_days as usize);
    }

    #[tokio::test]
    async fn should_forward_shutdown_only_when_the_signal_arrives() {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(forward_shutdown_signal(async { Ok(()) }, tx));
        assert!(tokio::time::timeout(std::time::Duration::from_secs(1), rx).await.unwrap().is_ok());

        let (tx, rx) = oneshot::channel();
        let failing = async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal handler")) };
        tokio::spawn(forward_shutdown_signal(failing, tx));
        assert!(tokio::time::timeout(std::time::Duration::from_millis(100), rx).await.is_err());
    }

    #[test]
    fn should_accept_legacy_doc_id_field() {
        let request: BookRequest =
            serde_json::from_str(r#"{"docId":"doc1","slotDate":"17_10_2026","slotTime":"10:00 AM"}"#).unwrap();
        assert_eq!(request.doctor_id, "doc1");
        assert_eq!(request.slot_date, "17_10_2026");
    }
}
