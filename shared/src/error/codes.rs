//! Unified error codes for the membership platform
//!
//! This module defines all error codes shared by the engine, admin tooling and
//! API clients. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Application errors
//! - 2xxx: Document / OCR errors
//! - 3xxx: Payment errors
//! - 4xxx: Membership period errors
//! - 5xxx: Annual fee configuration errors
//! - 6xxx: Vehicle errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 6,
    /// Operation not permitted for this caller
    Forbidden = 7,

    // ==================== 1xxx: Application ====================
    /// Membership application not found
    ApplicationNotFound = 1001,
    /// User already has a non-terminal application
    DuplicateActiveApplication = 1002,
    /// VIN already registered on another application
    DuplicateApplicationVin = 1003,
    /// Transition attempted outside its legal predecessor state
    InvalidTransition = 1004,
    /// Application is completed or cancelled
    TerminalApplication = 1005,
    /// Completed applications cannot be rejected
    ApplicationAlreadyCompleted = 1006,

    // ==================== 2xxx: Document / OCR ====================
    /// Application document not found
    DocumentNotFound = 2001,
    /// A document of this type already exists for the application
    DuplicateDocumentType = 2002,
    /// Document has already been verified
    DocumentAlreadyVerified = 2003,
    /// No OCR result recorded for the document
    OcrResultNotFound = 2101,
    /// OCR provider is not configured
    OcrUnavailable = 2102,
    /// Document type is not supported by the OCR provider
    OcrUnsupported = 2103,

    // ==================== 3xxx: Payment ====================
    /// Payment record not found
    PaymentNotFound = 3001,
    /// Confirmed enrollment payment already exists for the application
    DuplicateEnrollmentPayment = 3002,
    /// Confirmed annual payment already exists for the user and year
    DuplicateAnnualPayment = 3003,
    /// Payment has already been confirmed
    PaymentAlreadyConfirmed = 3004,
    /// Payment status does not permit this operation
    InvalidPaymentStatus = 3005,
    /// Refund amount exceeds the original payment
    RefundExceedsAmount = 3006,

    // ==================== 4xxx: Membership period ====================
    /// Membership period not found
    PeriodNotFound = 4001,
    /// A period already exists for the user and year
    PeriodAlreadyExists = 4002,
    /// Period status does not permit this transition
    InvalidPeriodState = 4003,
    /// Annual renewal payment carries no target year
    MissingTargetYear = 4004,
    /// Payment fee type does not match the requested operation
    WrongFeeType = 4005,

    // ==================== 5xxx: Annual fee configuration ====================
    /// No explicit fee configuration for the year
    FeeConfigNotFound = 5001,
    /// Fee configuration already exists for the year
    DuplicateFeeConfig = 5002,
    /// Configured dates violate start <= carry-over <= deadline
    InvalidFeePeriod = 5003,

    // ==================== 6xxx: Vehicle ====================
    /// Member vehicle not found
    VehicleNotFound = 6001,
    /// VIN already registered on another vehicle
    DuplicateVehicleVin = 6002,
    /// Caller does not own the vehicle
    NotVehicleOwner = 6003,
    /// Vehicle status does not permit this operation
    InvalidVehicleState = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Storage error
    StorageError = 9002,
    /// Serialization error
    SerializationError = 9003,
    /// Configuration error
    ConfigError = 9004,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::Forbidden => "Operation not permitted",

            // Application
            ErrorCode::ApplicationNotFound => "Membership application not found",
            ErrorCode::DuplicateActiveApplication => {
                "User already has an application in progress"
            }
            ErrorCode::DuplicateApplicationVin => {
                "VIN is already registered on another application"
            }
            ErrorCode::InvalidTransition => "Application state does not permit this transition",
            ErrorCode::TerminalApplication => "Application is completed or cancelled",
            ErrorCode::ApplicationAlreadyCompleted => {
                "Completed applications cannot be rejected"
            }

            // Document / OCR
            ErrorCode::DocumentNotFound => "Application document not found",
            ErrorCode::DuplicateDocumentType => {
                "A document of this type is already registered"
            }
            ErrorCode::DocumentAlreadyVerified => "Document has already been verified",
            ErrorCode::OcrResultNotFound => "No OCR result recorded for this document",
            ErrorCode::OcrUnavailable => "OCR provider is not configured",
            ErrorCode::OcrUnsupported => "Document type is not supported by the OCR provider",

            // Payment
            ErrorCode::PaymentNotFound => "Payment record not found",
            ErrorCode::DuplicateEnrollmentPayment => {
                "A confirmed enrollment payment already exists for this application"
            }
            ErrorCode::DuplicateAnnualPayment => {
                "A confirmed annual payment already exists for this user and year"
            }
            ErrorCode::PaymentAlreadyConfirmed => "Payment has already been confirmed",
            ErrorCode::InvalidPaymentStatus => "Payment status does not permit this operation",
            ErrorCode::RefundExceedsAmount => "Refund amount exceeds the original payment",

            // Membership period
            ErrorCode::PeriodNotFound => "Membership period not found",
            ErrorCode::PeriodAlreadyExists => {
                "A membership period already exists for this user and year"
            }
            ErrorCode::InvalidPeriodState => "Period status does not permit this transition",
            ErrorCode::MissingTargetYear => "Renewal payment carries no target year",
            ErrorCode::WrongFeeType => "Payment fee type does not match this operation",

            // Annual fee configuration
            ErrorCode::FeeConfigNotFound => "No fee configuration exists for this year",
            ErrorCode::DuplicateFeeConfig => "Fee configuration already exists for this year",
            ErrorCode::InvalidFeePeriod => {
                "Renewal start must not be after carry-over deadline or renewal deadline"
            }

            // Vehicle
            ErrorCode::VehicleNotFound => "Member vehicle not found",
            ErrorCode::DuplicateVehicleVin => "VIN is already registered on another vehicle",
            ErrorCode::NotVehicleOwner => "Only the vehicle owner may perform this operation",
            ErrorCode::InvalidVehicleState => "Vehicle status does not permit this operation",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageError => "Storage error",
            ErrorCode::SerializationError => "Serialization error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
        }
    }

}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::RequiredField),
            7 => Ok(ErrorCode::Forbidden),

            // Application
            1001 => Ok(ErrorCode::ApplicationNotFound),
            1002 => Ok(ErrorCode::DuplicateActiveApplication),
            1003 => Ok(ErrorCode::DuplicateApplicationVin),
            1004 => Ok(ErrorCode::InvalidTransition),
            1005 => Ok(ErrorCode::TerminalApplication),
            1006 => Ok(ErrorCode::ApplicationAlreadyCompleted),

            // Document / OCR
            2001 => Ok(ErrorCode::DocumentNotFound),
            2002 => Ok(ErrorCode::DuplicateDocumentType),
            2003 => Ok(ErrorCode::DocumentAlreadyVerified),
            2101 => Ok(ErrorCode::OcrResultNotFound),
            2102 => Ok(ErrorCode::OcrUnavailable),
            2103 => Ok(ErrorCode::OcrUnsupported),

            // Payment
            3001 => Ok(ErrorCode::PaymentNotFound),
            3002 => Ok(ErrorCode::DuplicateEnrollmentPayment),
            3003 => Ok(ErrorCode::DuplicateAnnualPayment),
            3004 => Ok(ErrorCode::PaymentAlreadyConfirmed),
            3005 => Ok(ErrorCode::InvalidPaymentStatus),
            3006 => Ok(ErrorCode::RefundExceedsAmount),

            // Membership period
            4001 => Ok(ErrorCode::PeriodNotFound),
            4002 => Ok(ErrorCode::PeriodAlreadyExists),
            4003 => Ok(ErrorCode::InvalidPeriodState),
            4004 => Ok(ErrorCode::MissingTargetYear),
            4005 => Ok(ErrorCode::WrongFeeType),

            // Annual fee configuration
            5001 => Ok(ErrorCode::FeeConfigNotFound),
            5002 => Ok(ErrorCode::DuplicateFeeConfig),
            5003 => Ok(ErrorCode::InvalidFeePeriod),

            // Vehicle
            6001 => Ok(ErrorCode::VehicleNotFound),
            6002 => Ok(ErrorCode::DuplicateVehicleVin),
            6003 => Ok(ErrorCode::NotVehicleOwner),
            6004 => Ok(ErrorCode::InvalidVehicleState),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StorageError),
            9003 => Ok(ErrorCode::SerializationError),
            9004 => Ok(ErrorCode::ConfigError),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
