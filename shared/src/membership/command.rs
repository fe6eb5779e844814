//! Membership commands - requested state transitions
//!
//! Commands enter the manager, which checks idempotency by `command_id`,
//! runs the matching action in one write transaction, and answers with a
//! [`CommandResponse`].

use super::types::{
    ApplicantSnapshot, DocumentType, FeeType, FileReference, OwnershipCategory, VehicleSnapshot,
};
use crate::error::ErrorCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Command envelope
///
/// `operator_id` is the acting admin or member; commands the orchestrator
/// issues on its own carry no operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipCommand {
    /// Unique command id, the idempotency key
    pub command_id: String,
    /// Acting user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<u64>,
    /// Acting user's name (snapshot for audit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_name: Option<String>,
    /// Issuer timestamp (Unix millis)
    pub timestamp: i64,
    /// The requested operation
    pub payload: CommandPayload,
}

impl MembershipCommand {
    /// Wrap a payload with a fresh command id and timestamp
    pub fn new(payload: CommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            operator_id: None,
            operator_name: None,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    /// Same, but with an explicit command id (for derived, deterministic
    /// commands that must dedupe across redeliveries)
    pub fn with_id(command_id: String, payload: CommandPayload) -> Self {
        Self {
            command_id,
            operator_id: None,
            operator_name: None,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    /// Attach the acting operator
    pub fn by_operator(mut self, operator_id: u64, operator_name: impl Into<String>) -> Self {
        self.operator_id = Some(operator_id);
        self.operator_name = Some(operator_name.into());
        self
    }
}

/// Every operation the engine accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandPayload {
    // ========== Applications ==========
    SubmitApplication {
        user_id: u64,
        category: OwnershipCategory,
        applicant: ApplicantSnapshot,
        vehicle: VehicleSnapshot,
    },

    UploadDocument {
        application_id: u64,
        document_type: DocumentType,
        file: FileReference,
    },

    VerifyDocument {
        application_id: u64,
        document_type: DocumentType,
    },

    RejectDocument {
        application_id: u64,
        document_type: DocumentType,
        reason: String,
    },

    StartReview {
        application_id: u64,
    },

    ApproveApplication {
        application_id: u64,
    },

    RejectApplication {
        application_id: u64,
        reason: String,
    },

    CancelApplication {
        application_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Issue the enrollment fee notice. Amount and year fall back to the
    /// fee calendar when absent.
    MarkPaymentPending {
        application_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<Decimal>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_year: Option<i32>,
    },

    // ========== Payments ==========
    RegisterPayment {
        user_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        application_id: Option<u64>,
        fee_type: FeeType,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_year: Option<i32>,
        amount: Decimal,
        depositor_name: String,
        deposit_date: NaiveDate,
    },

    ConfirmPaymentManual {
        payment_id: u64,
    },

    ConfirmPaymentAutomatic {
        payment_id: u64,
        bank_tx_id: String,
        bank_account: String,
    },

    CancelPayment {
        payment_id: u64,
        reason: String,
    },

    RefundPayment {
        payment_id: u64,
        refund_amount: Decimal,
    },

    // ========== Membership periods ==========
    CreateInitialPeriod {
        user_id: u64,
        payment_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_year: Option<i32>,
    },

    RenewMembership {
        user_id: u64,
        payment_id: u64,
    },

    /// Derived command: complete the application, allocate the member number
    /// and create the initial period in one transaction
    FinalizeEnrollment {
        application_id: u64,
    },

    ExpirePeriod {
        period_id: u64,
    },

    CancelPeriod {
        period_id: u64,
    },

    MarkExpirationNotified {
        period_id: u64,
    },

    // ========== Annual fee configuration ==========
    CreateFeeConfig {
        target_year: i32,
        carry_over_deadline: NaiveDate,
        renewal_start_date: NaiveDate,
        renewal_deadline: NaiveDate,
        enrollment_fee: Decimal,
        annual_fee: Decimal,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },

    UpdateFeeConfig {
        target_year: i32,
        carry_over_deadline: NaiveDate,
        renewal_start_date: NaiveDate,
        renewal_deadline: NaiveDate,
        enrollment_fee: Decimal,
        annual_fee: Decimal,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },

    // ========== Vehicles ==========
    RegisterVehicle {
        user_id: u64,
        plate_number: String,
        vin: String,
        model_name: String,
        category: OwnershipCategory,
        is_primary: bool,
    },

    UpdateVehicle {
        vehicle_id: u64,
        user_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        plate_number: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        model_name: Option<String>,
    },

    SetPrimaryVehicle {
        vehicle_id: u64,
        user_id: u64,
    },

    RemoveVehicle {
        vehicle_id: u64,
        user_id: u64,
    },

    MarkVehicleSold {
        vehicle_id: u64,
        user_id: u64,
        sold_at: NaiveDate,
    },

    // ========== OCR ==========
    ReprocessOcr {
        application_id: u64,
        document_type: DocumentType,
    },
}

impl CommandPayload {
    /// Stable command name, identical to the serde tag. Used for audit
    /// logging.
    pub fn command_type(&self) -> &'static str {
        match self {
            CommandPayload::SubmitApplication { .. } => "SUBMIT_APPLICATION",
            CommandPayload::UploadDocument { .. } => "UPLOAD_DOCUMENT",
            CommandPayload::VerifyDocument { .. } => "VERIFY_DOCUMENT",
            CommandPayload::RejectDocument { .. } => "REJECT_DOCUMENT",
            CommandPayload::StartReview { .. } => "START_REVIEW",
            CommandPayload::ApproveApplication { .. } => "APPROVE_APPLICATION",
            CommandPayload::RejectApplication { .. } => "REJECT_APPLICATION",
            CommandPayload::CancelApplication { .. } => "CANCEL_APPLICATION",
            CommandPayload::MarkPaymentPending { .. } => "MARK_PAYMENT_PENDING",
            CommandPayload::RegisterPayment { .. } => "REGISTER_PAYMENT",
            CommandPayload::ConfirmPaymentManual { .. } => "CONFIRM_PAYMENT_MANUAL",
            CommandPayload::ConfirmPaymentAutomatic { .. } => "CONFIRM_PAYMENT_AUTOMATIC",
            CommandPayload::CancelPayment { .. } => "CANCEL_PAYMENT",
            CommandPayload::RefundPayment { .. } => "REFUND_PAYMENT",
            CommandPayload::CreateInitialPeriod { .. } => "CREATE_INITIAL_PERIOD",
            CommandPayload::RenewMembership { .. } => "RENEW_MEMBERSHIP",
            CommandPayload::FinalizeEnrollment { .. } => "FINALIZE_ENROLLMENT",
            CommandPayload::ExpirePeriod { .. } => "EXPIRE_PERIOD",
            CommandPayload::CancelPeriod { .. } => "CANCEL_PERIOD",
            CommandPayload::MarkExpirationNotified { .. } => "MARK_EXPIRATION_NOTIFIED",
            CommandPayload::CreateFeeConfig { .. } => "CREATE_FEE_CONFIG",
            CommandPayload::UpdateFeeConfig { .. } => "UPDATE_FEE_CONFIG",
            CommandPayload::RegisterVehicle { .. } => "REGISTER_VEHICLE",
            CommandPayload::UpdateVehicle { .. } => "UPDATE_VEHICLE",
            CommandPayload::SetPrimaryVehicle { .. } => "SET_PRIMARY_VEHICLE",
            CommandPayload::RemoveVehicle { .. } => "REMOVE_VEHICLE",
            CommandPayload::MarkVehicleSold { .. } => "MARK_VEHICLE_SOLD",
            CommandPayload::ReprocessOcr { .. } => "REPROCESS_OCR",
        }
    }
}

/// Manager's answer to a command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command id this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Id of the entity the command created, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<u64>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, entity_id: Option<u64>) -> Self {
        Self {
            command_id,
            success: true,
            entity_id,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            entity_id: None,
            error: Some(error),
        }
    }

    /// Redelivered command that was already processed: success, no new entity
    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            entity_id: None,
            error: None,
        }
    }
}

/// Failure detail carried by a [`CommandResponse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: ErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
