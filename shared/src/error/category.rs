//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Application errors
/// - 2xxx: Document / OCR errors
/// - 3xxx: Payment errors
/// - 4xxx: Membership period errors
/// - 5xxx: Annual fee configuration errors
/// - 6xxx: Vehicle errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Application errors (1xxx)
    Application,
    /// Document / OCR errors (2xxx)
    Document,
    /// Payment errors (3xxx)
    Payment,
    /// Membership period errors (4xxx)
    Period,
    /// Annual fee configuration errors (5xxx)
    FeeConfig,
    /// Vehicle errors (6xxx)
    Vehicle,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Application,
            2000..3000 => Self::Document,
            3000..4000 => Self::Payment,
            4000..5000 => Self::Period,
            5000..6000 => Self::FeeConfig,
            6000..7000 => Self::Vehicle,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Application => "application",
            Self::Document => "document",
            Self::Payment => "payment",
            Self::Period => "period",
            Self::FeeConfig => "fee_config",
            Self::Vehicle => "vehicle",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(7), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);

        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Application);
        assert_eq!(ErrorCategory::from_code(1999), ErrorCategory::Application);

        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Document);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Payment);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Period);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::FeeConfig);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Vehicle);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::Success.category(), ErrorCategory::General);
        assert_eq!(
            ErrorCode::ApplicationNotFound.category(),
            ErrorCategory::Application
        );
        assert_eq!(
            ErrorCode::DocumentAlreadyVerified.category(),
            ErrorCategory::Document
        );
        assert_eq!(
            ErrorCode::PaymentAlreadyConfirmed.category(),
            ErrorCategory::Payment
        );
        assert_eq!(
            ErrorCode::PeriodAlreadyExists.category(),
            ErrorCategory::Period
        );
        assert_eq!(
            ErrorCode::FeeConfigNotFound.category(),
            ErrorCategory::FeeConfig
        );
        assert_eq!(ErrorCode::VehicleNotFound.category(), ErrorCategory::Vehicle);
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_name() {
        assert_eq!(ErrorCategory::General.name(), "general");
        assert_eq!(ErrorCategory::Application.name(), "application");
        assert_eq!(ErrorCategory::Document.name(), "document");
        assert_eq!(ErrorCategory::Payment.name(), "payment");
        assert_eq!(ErrorCategory::Period.name(), "period");
        assert_eq!(ErrorCategory::FeeConfig.name(), "fee_config");
        assert_eq!(ErrorCategory::Vehicle.name(), "vehicle");
        assert_eq!(ErrorCategory::System.name(), "system");
    }

    #[test]
    fn test_category_serialize() {
        let category = ErrorCategory::Application;
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, "\"application\"");

        let category = ErrorCategory::FeeConfig;
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, "\"fee_config\"");
    }

    #[test]
    fn test_category_deserialize() {
        let category: ErrorCategory = serde_json::from_str("\"payment\"").unwrap();
        assert_eq!(category, ErrorCategory::Payment);

        let category: ErrorCategory = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(category, ErrorCategory::System);
    }
}
