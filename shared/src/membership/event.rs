//! Membership events - immutable facts recorded after command processing
//!
//! Events are persisted in the same transaction as the state change and
//! broadcast after commit. The `PaymentConfirmed` event is what drives the
//! lifecycle orchestrator.

use super::types::{DocumentType, FeeType, OwnershipCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Membership event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    pub sequence: u64,
    /// Server timestamp (Unix milliseconds), set when the event is created
    pub timestamp: i64,
    /// Operator who triggered this event, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<u64>,
    /// Operator name (snapshot for audit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_name: Option<String>,
    /// Command that produced this event (for audit tracing)
    pub command_id: String,
    /// Event type
    pub event_type: MembershipEventType,
    /// Event payload
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipEventType {
    // Applications
    ApplicationSubmitted,
    DocumentUploaded,
    DocumentVerified,
    DocumentRejected,
    ReviewStarted,
    ApplicationApproved,
    ApplicationRejected,
    ApplicationCancelled,
    FeeNoticeIssued,
    ApplicationCompleted,

    // Payments
    PaymentRegistered,
    PaymentConfirmed,
    PaymentCancelled,
    PaymentRefunded,

    // Membership periods
    PeriodCreated,
    PeriodExpired,
    PeriodCancelled,
    ExpirationNotified,

    // Annual fee configuration
    FeeConfigCreated,
    FeeConfigUpdated,

    // Vehicles
    VehicleRegistered,
    VehicleUpdated,
    VehiclePrimaryChanged,
    VehicleRemoved,
    VehicleSold,

    // OCR
    OcrProcessed,
}

impl std::fmt::Display for MembershipEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipEventType::ApplicationSubmitted => write!(f, "APPLICATION_SUBMITTED"),
            MembershipEventType::DocumentUploaded => write!(f, "DOCUMENT_UPLOADED"),
            MembershipEventType::DocumentVerified => write!(f, "DOCUMENT_VERIFIED"),
            MembershipEventType::DocumentRejected => write!(f, "DOCUMENT_REJECTED"),
            MembershipEventType::ReviewStarted => write!(f, "REVIEW_STARTED"),
            MembershipEventType::ApplicationApproved => write!(f, "APPLICATION_APPROVED"),
            MembershipEventType::ApplicationRejected => write!(f, "APPLICATION_REJECTED"),
            MembershipEventType::ApplicationCancelled => write!(f, "APPLICATION_CANCELLED"),
            MembershipEventType::FeeNoticeIssued => write!(f, "FEE_NOTICE_ISSUED"),
            MembershipEventType::ApplicationCompleted => write!(f, "APPLICATION_COMPLETED"),
            MembershipEventType::PaymentRegistered => write!(f, "PAYMENT_REGISTERED"),
            MembershipEventType::PaymentConfirmed => write!(f, "PAYMENT_CONFIRMED"),
            MembershipEventType::PaymentCancelled => write!(f, "PAYMENT_CANCELLED"),
            MembershipEventType::PaymentRefunded => write!(f, "PAYMENT_REFUNDED"),
            MembershipEventType::PeriodCreated => write!(f, "PERIOD_CREATED"),
            MembershipEventType::PeriodExpired => write!(f, "PERIOD_EXPIRED"),
            MembershipEventType::PeriodCancelled => write!(f, "PERIOD_CANCELLED"),
            MembershipEventType::ExpirationNotified => write!(f, "EXPIRATION_NOTIFIED"),
            MembershipEventType::FeeConfigCreated => write!(f, "FEE_CONFIG_CREATED"),
            MembershipEventType::FeeConfigUpdated => write!(f, "FEE_CONFIG_UPDATED"),
            MembershipEventType::VehicleRegistered => write!(f, "VEHICLE_REGISTERED"),
            MembershipEventType::VehicleUpdated => write!(f, "VEHICLE_UPDATED"),
            MembershipEventType::VehiclePrimaryChanged => write!(f, "VEHICLE_PRIMARY_CHANGED"),
            MembershipEventType::VehicleRemoved => write!(f, "VEHICLE_REMOVED"),
            MembershipEventType::VehicleSold => write!(f, "VEHICLE_SOLD"),
            MembershipEventType::OcrProcessed => write!(f, "OCR_PROCESSED"),
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Applications ==========
    ApplicationSubmitted {
        application_id: u64,
        user_id: u64,
        application_number: String,
        category: OwnershipCategory,
        vin: String,
    },

    DocumentUploaded {
        application_id: u64,
        document_id: u64,
        document_type: DocumentType,
        /// True when the upload replaced a rejected document
        replaced: bool,
    },

    DocumentVerified {
        application_id: u64,
        document_id: u64,
        document_type: DocumentType,
    },

    DocumentRejected {
        application_id: u64,
        document_id: u64,
        document_type: DocumentType,
        reason: String,
    },

    ReviewStarted {
        application_id: u64,
    },

    ApplicationApproved {
        application_id: u64,
        user_id: u64,
    },

    ApplicationRejected {
        application_id: u64,
        user_id: u64,
        reason: String,
    },

    ApplicationCancelled {
        application_id: u64,
        user_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    FeeNoticeIssued {
        application_id: u64,
        user_id: u64,
        amount: Decimal,
        target_year: i32,
    },

    ApplicationCompleted {
        application_id: u64,
        user_id: u64,
        member_number: u32,
        target_year: i32,
    },

    // ========== Payments ==========
    PaymentRegistered {
        payment_id: u64,
        user_id: u64,
        fee_type: FeeType,
        #[serde(skip_serializing_if = "Option::is_none")]
        application_id: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_year: Option<i32>,
        amount: Decimal,
    },

    /// The orchestrator's trigger
    PaymentConfirmed {
        payment_id: u64,
        user_id: u64,
        fee_type: FeeType,
        #[serde(skip_serializing_if = "Option::is_none")]
        application_id: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_year: Option<i32>,
        amount: Decimal,
        deposit_date: NaiveDate,
        /// Confirming admin; empty for automatic bank-feed confirmation
        #[serde(skip_serializing_if = "Option::is_none")]
        confirmed_by: Option<u64>,
    },

    PaymentCancelled {
        payment_id: u64,
        user_id: u64,
        reason: String,
        /// Whether the record had been confirmed before cancellation
        was_confirmed: bool,
    },

    PaymentRefunded {
        payment_id: u64,
        user_id: u64,
        refund_amount: Decimal,
    },

    // ========== Membership periods ==========
    PeriodCreated {
        period_id: u64,
        user_id: u64,
        year: i32,
        payment_id: u64,
        is_renewed: bool,
    },

    PeriodExpired {
        period_id: u64,
        user_id: u64,
        year: i32,
    },

    PeriodCancelled {
        period_id: u64,
        user_id: u64,
        year: i32,
    },

    ExpirationNotified {
        period_id: u64,
        user_id: u64,
        year: i32,
    },

    // ========== Annual fee configuration ==========
    FeeConfigCreated {
        target_year: i32,
    },

    FeeConfigUpdated {
        target_year: i32,
    },

    // ========== Vehicles ==========
    VehicleRegistered {
        vehicle_id: u64,
        user_id: u64,
        vin: String,
        is_primary: bool,
    },

    VehicleUpdated {
        vehicle_id: u64,
        user_id: u64,
    },

    VehiclePrimaryChanged {
        vehicle_id: u64,
        user_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_primary_id: Option<u64>,
    },

    VehicleRemoved {
        vehicle_id: u64,
        user_id: u64,
        vin: String,
    },

    VehicleSold {
        vehicle_id: u64,
        user_id: u64,
        sold_at: NaiveDate,
        grace_period_end: NaiveDate,
    },

    // ========== OCR ==========
    OcrProcessed {
        application_id: u64,
        document_id: u64,
        ocr_record_id: u64,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_matched: Option<bool>,
    },
}

impl EventPayload {
    /// Id of the entity this event is primarily about. Fee config events
    /// have no entity id; they are keyed by year.
    pub fn entity_id(&self) -> Option<u64> {
        match self {
            EventPayload::ApplicationSubmitted { application_id, .. }
            | EventPayload::ReviewStarted { application_id }
            | EventPayload::ApplicationApproved { application_id, .. }
            | EventPayload::ApplicationRejected { application_id, .. }
            | EventPayload::ApplicationCancelled { application_id, .. }
            | EventPayload::FeeNoticeIssued { application_id, .. }
            | EventPayload::ApplicationCompleted { application_id, .. } => Some(*application_id),
            EventPayload::DocumentUploaded { document_id, .. }
            | EventPayload::DocumentVerified { document_id, .. }
            | EventPayload::DocumentRejected { document_id, .. } => Some(*document_id),
            EventPayload::PaymentRegistered { payment_id, .. }
            | EventPayload::PaymentConfirmed { payment_id, .. }
            | EventPayload::PaymentCancelled { payment_id, .. }
            | EventPayload::PaymentRefunded { payment_id, .. } => Some(*payment_id),
            EventPayload::PeriodCreated { period_id, .. }
            | EventPayload::PeriodExpired { period_id, .. }
            | EventPayload::PeriodCancelled { period_id, .. }
            | EventPayload::ExpirationNotified { period_id, .. } => Some(*period_id),
            EventPayload::FeeConfigCreated { .. } | EventPayload::FeeConfigUpdated { .. } => None,
            EventPayload::VehicleRegistered { vehicle_id, .. }
            | EventPayload::VehicleUpdated { vehicle_id, .. }
            | EventPayload::VehiclePrimaryChanged { vehicle_id, .. }
            | EventPayload::VehicleRemoved { vehicle_id, .. }
            | EventPayload::VehicleSold { vehicle_id, .. } => Some(*vehicle_id),
            EventPayload::OcrProcessed { ocr_record_id, .. } => Some(*ocr_record_id),
        }
    }
}

impl MembershipEvent {
    /// Create a new event. The server timestamp is set here.
    pub fn new(
        sequence: u64,
        operator_id: Option<u64>,
        operator_name: Option<String>,
        command_id: String,
        event_type: MembershipEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            timestamp: crate::util::now_millis(),
            operator_id,
            operator_name,
            command_id,
            event_type,
            payload,
        }
    }

    /// Create an event from the command that triggered it
    pub fn from_command(
        sequence: u64,
        command: &super::MembershipCommand,
        event_type: MembershipEventType,
        payload: EventPayload,
    ) -> Self {
        Self::new(
            sequence,
            command.operator_id,
            command.operator_name.clone(),
            command.command_id.clone(),
            event_type,
            payload,
        )
    }
}
