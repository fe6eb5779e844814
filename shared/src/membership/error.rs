//! Domain errors raised by membership aggregates and actions

use super::types::{
    ApplicationStatus, DocumentType, FeeType, PaymentStatus, PeriodStatus, VehicleStatus,
};
use crate::error::{AppError, ErrorCode};
use rust_decimal::Decimal;
use thiserror::Error;

/// Business-rule violations from the membership domain
///
/// Every variant maps to a stable [`ErrorCode`] via [`DomainError::error_code`],
/// which also decides the HTTP status on the API surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    // ========== Applications ==========
    #[error("Application not found: {0}")]
    ApplicationNotFound(u64),

    #[error("User {user_id} already has an application in progress")]
    DuplicateActiveApplication { user_id: u64 },

    #[error("VIN already used by another active application: {vin}")]
    DuplicateVin { vin: String },

    #[error("Cannot {action} application in status {status:?}")]
    InvalidTransition {
        status: ApplicationStatus,
        action: &'static str,
    },

    #[error("Application is in terminal status {status:?}")]
    TerminalApplication { status: ApplicationStatus },

    #[error("Application already completed")]
    ApplicationAlreadyCompleted,

    // ========== Documents ==========
    #[error("Document not found: application {application_id}, type {document_type}")]
    DocumentNotFound {
        application_id: u64,
        document_type: DocumentType,
    },

    #[error("Document of type {doc_type} already uploaded")]
    DuplicateDocumentType { doc_type: DocumentType },

    #[error("Document already verified: {0}")]
    DocumentAlreadyVerified(u64),

    // ========== OCR ==========
    #[error("OCR provider is not available")]
    OcrUnavailable,

    #[error("OCR provider does not support document type {document_type}")]
    OcrUnsupported { document_type: DocumentType },

    // ========== Payments ==========
    #[error("Payment record not found: {0}")]
    PaymentNotFound(u64),

    #[error("Enrollment fee already confirmed for application {application_id}")]
    DuplicateEnrollmentPayment { application_id: u64 },

    #[error("Annual fee already confirmed for user {user_id}, year {target_year}")]
    DuplicateAnnualPayment { user_id: u64, target_year: i32 },

    #[error("Payment already confirmed: {0}")]
    PaymentAlreadyConfirmed(u64),

    #[error("Cannot {action} payment in status {status:?}")]
    InvalidPaymentStatus {
        status: PaymentStatus,
        action: &'static str,
    },

    #[error("Refund {refund} exceeds payment amount {amount}")]
    RefundExceedsAmount { refund: Decimal, amount: Decimal },

    // ========== Membership periods ==========
    #[error("Membership period not found: {0}")]
    PeriodNotFound(u64),

    #[error("Membership period already exists for user {user_id}, year {year}")]
    PeriodAlreadyExists { user_id: u64, year: i32 },

    #[error("Cannot {action} period in status {status:?}")]
    InvalidPeriodState {
        status: PeriodStatus,
        action: &'static str,
    },

    #[error("Annual fee payment requires a target year")]
    MissingTargetYear,

    #[error("Expected {expected:?} payment, got {actual:?}")]
    WrongFeeType { expected: FeeType, actual: FeeType },

    // ========== Annual fee configuration ==========
    #[error("Annual fee configuration not found for year {0}")]
    FeeConfigNotFound(i32),

    #[error("Annual fee configuration already exists for year {0}")]
    DuplicateFeeConfig(i32),

    #[error("Renewal start must not be after carry-over deadline or renewal deadline")]
    InvalidFeePeriod,

    // ========== Vehicles ==========
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(u64),

    #[error("VIN already registered: {vin}")]
    DuplicateVehicleVin { vin: String },

    #[error("Vehicle {vehicle_id} does not belong to user {user_id}")]
    NotVehicleOwner { vehicle_id: u64, user_id: u64 },

    #[error("Cannot {action} vehicle in status {status:?}")]
    InvalidVehicleState {
        status: VehicleStatus,
        action: &'static str,
    },

    // ========== Validation ==========
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError {
    /// Stable numeric code for API responses and audit logs
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ApplicationNotFound(_) => ErrorCode::ApplicationNotFound,
            Self::DuplicateActiveApplication { .. } => ErrorCode::DuplicateActiveApplication,
            Self::DuplicateVin { .. } => ErrorCode::DuplicateApplicationVin,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::TerminalApplication { .. } => ErrorCode::TerminalApplication,
            Self::ApplicationAlreadyCompleted => ErrorCode::ApplicationAlreadyCompleted,
            Self::DocumentNotFound { .. } => ErrorCode::DocumentNotFound,
            Self::DuplicateDocumentType { .. } => ErrorCode::DuplicateDocumentType,
            Self::DocumentAlreadyVerified(_) => ErrorCode::DocumentAlreadyVerified,
            Self::OcrUnavailable => ErrorCode::OcrUnavailable,
            Self::OcrUnsupported { .. } => ErrorCode::OcrUnsupported,
            Self::PaymentNotFound(_) => ErrorCode::PaymentNotFound,
            Self::DuplicateEnrollmentPayment { .. } => ErrorCode::DuplicateEnrollmentPayment,
            Self::DuplicateAnnualPayment { .. } => ErrorCode::DuplicateAnnualPayment,
            Self::PaymentAlreadyConfirmed(_) => ErrorCode::PaymentAlreadyConfirmed,
            Self::InvalidPaymentStatus { .. } => ErrorCode::InvalidPaymentStatus,
            Self::RefundExceedsAmount { .. } => ErrorCode::RefundExceedsAmount,
            Self::PeriodNotFound(_) => ErrorCode::PeriodNotFound,
            Self::PeriodAlreadyExists { .. } => ErrorCode::PeriodAlreadyExists,
            Self::InvalidPeriodState { .. } => ErrorCode::InvalidPeriodState,
            Self::MissingTargetYear => ErrorCode::MissingTargetYear,
            Self::WrongFeeType { .. } => ErrorCode::WrongFeeType,
            Self::FeeConfigNotFound(_) => ErrorCode::FeeConfigNotFound,
            Self::DuplicateFeeConfig(_) => ErrorCode::DuplicateFeeConfig,
            Self::InvalidFeePeriod => ErrorCode::InvalidFeePeriod,
            Self::VehicleNotFound(_) => ErrorCode::VehicleNotFound,
            Self::DuplicateVehicleVin { .. } => ErrorCode::DuplicateVehicleVin,
            Self::NotVehicleOwner { .. } => ErrorCode::NotVehicleOwner,
            Self::InvalidVehicleState { .. } => ErrorCode::InvalidVehicleState,
            Self::InvalidInput(_) => ErrorCode::ValidationFailed,
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::with_message(err.error_code(), err.to_string())
    }
}

/// Result alias for aggregate methods
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            DomainError::ApplicationNotFound(42).error_code(),
            ErrorCode::ApplicationNotFound
        );
        assert_eq!(
            DomainError::DuplicateAnnualPayment {
                user_id: 1,
                target_year: 2025
            }
            .error_code(),
            ErrorCode::DuplicateAnnualPayment
        );
        assert_eq!(
            DomainError::InvalidFeePeriod.error_code(),
            ErrorCode::InvalidFeePeriod
        );
        assert_eq!(
            DomainError::InvalidInput("bad".into()).error_code(),
            ErrorCode::ValidationFailed
        );
    }

    #[test]
    fn test_display_messages() {
        let err = DomainError::DuplicateVin {
            vin: "WP0ZZZ99ZTS392124".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "VIN already used by another active application: WP0ZZZ99ZTS392124"
        );

        let err = DomainError::InvalidTransition {
            status: ApplicationStatus::Completed,
            action: "submit documents for",
        };
        assert!(err.to_string().contains("Completed"));
    }

    #[test]
    fn test_refund_exceeds_message() {
        let err = DomainError::RefundExceedsAmount {
            refund: Decimal::new(300_000, 0),
            amount: Decimal::new(200_000, 0),
        };
        assert_eq!(err.to_string(), "Refund 300000 exceeds payment amount 200000");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = DomainError::PaymentAlreadyConfirmed(7).into();
        assert_eq!(app.code, ErrorCode::PaymentAlreadyConfirmed);
        assert_eq!(app.message, "Payment already confirmed: 7");
    }
}
