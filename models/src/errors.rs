// models/src/errors.rs

pub use thiserror::Error;

/// Coarse grouping of failures. Clients use it to decide between
/// "refresh and re-pick", "retry later" and "log in again".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    ExternalDependency,
    Authorization,
    Internal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppointmentError {
    #[error("doctor {0} was not found")]
    DoctorNotFound(String),
    #[error("doctor {0} is not accepting appointments")]
    DoctorUnavailable(String),
    #[error("invalid slot: {0}")]
    InvalidSlot(String),
    #[error("slot {date} {time} is already booked")]
    SlotTaken { date: String, time: String },
    #[error("appointment {0} was not found")]
    NotFound(String),
    #[error("appointment {0} is already cancelled")]
    AlreadyCancelled(String),
    #[error("appointment {0} is already completed")]
    AlreadyCompleted(String),
    #[error("appointment {0} is already settled")]
    AlreadySettled(String),
    #[error("payment verification failed: {0}")]
    VerificationFailed(String),
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppointmentError {
    /// Stable machine-readable identifier, part of the public error contract.
    pub fn kind(&self) -> &'static str {
        match self {
            AppointmentError::DoctorNotFound(_) => "doctor_not_found",
            AppointmentError::DoctorUnavailable(_) => "doctor_unavailable",
            AppointmentError::InvalidSlot(_) => "invalid_slot",
            AppointmentError::SlotTaken { .. } => "slot_taken",
            AppointmentError::NotFound(_) => "not_found",
            AppointmentError::AlreadyCancelled(_) => "already_cancelled",
            AppointmentError::AlreadyCompleted(_) => "already_completed",
            AppointmentError::AlreadySettled(_) => "already_settled",
            AppointmentError::VerificationFailed(_) => "verification_failed",
            AppointmentError::GatewayUnavailable(_) => "gateway_unavailable",
            AppointmentError::Unauthenticated => "unauthenticated",
            AppointmentError::Storage(_) => "storage_error",
            AppointmentError::Serialization(_) => "serialization_error",
            AppointmentError::Internal(_) => "internal_error",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppointmentError::DoctorNotFound(_)
            | AppointmentError::DoctorUnavailable(_)
            | AppointmentError::InvalidSlot(_)
            | AppointmentError::NotFound(_)
            | AppointmentError::VerificationFailed(_) => ErrorCategory::Validation,
            AppointmentError::SlotTaken { .. }
            | AppointmentError::AlreadyCancelled(_)
            | AppointmentError::AlreadyCompleted(_)
            | AppointmentError::AlreadySettled(_) => ErrorCategory::Conflict,
            AppointmentError::GatewayUnavailable(_) => ErrorCategory::ExternalDependency,
            AppointmentError::Unauthenticated => ErrorCategory::Authorization,
            AppointmentError::Storage(_)
            | AppointmentError::Serialization(_)
            | AppointmentError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Only gateway outages are worth retrying with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppointmentError::GatewayUnavailable(_))
    }
}

impl From<serde_json::Error> for AppointmentError {
    fn from(err: serde_json::Error) -> Self {
        AppointmentError::Serialization(format!("JSON processing error: {}", err))
    }
}

#[cfg(feature = "sled-errors")]
impl From<sled::Error> for AppointmentError {
    fn from(err: sled::Error) -> Self {
        AppointmentError::Storage(err.to_string())
    }
}

#[cfg(feature = "bincode-errors")]
impl From<bincode::error::EncodeError> for AppointmentError {
    fn from(err: bincode::error::EncodeError) -> Self {
        AppointmentError::Serialization(format!("bincode encode error: {}", err))
    }
}

#[cfg(feature = "bincode-errors")]
impl From<bincode::error::DecodeError> for AppointmentError {
    fn from(err: bincode::error::DecodeError) -> Self {
        AppointmentError::Serialization(format!("bincode decode error: {}", err))
    }
}

/// A validation error raised while parsing identifiers and slot keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier is empty or longer than 255 bytes.
    #[error("identifier has invalid length")]
    InvalidIdentifierLength,
    /// An identifier contains a character reserved for storage keys.
    #[error("identifier '{0}' is invalid")]
    InvalidIdentifier(String),
    #[error("invalid date format: {0}")]
    InvalidDateFormat(String),
    #[error("invalid time format: {0}")]
    InvalidTimeFormat(String),
}

impl From<ValidationError> for AppointmentError {
    fn from(err: ValidationError) -> Self {
        AppointmentError::InvalidSlot(err.to_string())
    }
}

pub type AppointmentResult<T> = Result<T, AppointmentError>;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_only_retry_gateway_outages() {
        assert!(AppointmentError::GatewayUnavailable("timeout".into()).is_retryable());
        assert!(!AppointmentError::VerificationFailed("mismatch".into()).is_retryable());
        assert!(!AppointmentError::SlotTaken { date: "2026-10-16".into(), time: "10:00".into() }.is_retryable());
    }

    #[test]
    fn should_group_conflicts_together() {
        let conflicts = [
            AppointmentError::SlotTaken { date: "2026-10-16".into(), time: "10:00".into() },
            AppointmentError::AlreadyCancelled("a".into()),
            AppointmentError::AlreadyCompleted("a".into()),
            AppointmentError::AlreadySettled("a".into()),
        ];
        for err in conflicts {
            assert_eq!(err.category(), ErrorCategory::Conflict, "{}", err.kind());
        }
        assert_eq!(AppointmentError::Unauthenticated.category(), ErrorCategory::Authorization);
        assert_eq!(AppointmentError::InvalidSlot("x".into()).category(), ErrorCategory::Validation);
    }

    #[test]
    fn should_map_validation_errors_to_invalid_slot() {
        let err: AppointmentError = ValidationError::InvalidTimeFormat("25:00".into()).into();
        assert_eq!(err.kind(), "invalid_slot");
    }
}
