//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::ApplicationNotFound
            | Self::DocumentNotFound
            | Self::OcrResultNotFound
            | Self::PaymentNotFound
            | Self::PeriodNotFound
            | Self::FeeConfigNotFound
            | Self::VehicleNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::DuplicateActiveApplication
            | Self::DuplicateApplicationVin
            | Self::DuplicateDocumentType
            | Self::DocumentAlreadyVerified
            | Self::DuplicateEnrollmentPayment
            | Self::DuplicateAnnualPayment
            | Self::PaymentAlreadyConfirmed
            | Self::PeriodAlreadyExists
            | Self::DuplicateFeeConfig
            | Self::DuplicateVehicleVin => StatusCode::CONFLICT,

            // 403 Forbidden
            Self::Forbidden | Self::NotVehicleOwner => StatusCode::FORBIDDEN,

            // 503 Service Unavailable (provider not wired up, client can retry later)
            Self::OcrUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::StorageError
            | Self::SerializationError
            | Self::ConfigError
            | Self::StorageCorrupted => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
