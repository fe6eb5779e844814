//! Membership Lifecycle Module
//!
//! This module provides the domain model for the membership engine:
//! - Aggregates: applications, payments, periods, fee configs, vehicles -
//!   every state change goes through an invariant-checking method
//! - Commands: requested transitions, processed by the server's manager
//! - Events: immutable facts recorded after command processing

pub mod application;
pub mod command;
pub mod error;
pub mod event;
pub mod fee_config;
pub mod ocr;
pub mod payment;
pub mod period;
pub mod types;
pub mod vehicle;

// Re-exports
pub use application::{ApplicationDocument, MembershipApplication};
pub use command::{CommandError, CommandPayload, CommandResponse, MembershipCommand};
pub use error::{DomainError, DomainResult};
pub use event::{EventPayload, MembershipEvent, MembershipEventType};
pub use fee_config::{AnnualFeeConfig, ConfigSource};
pub use ocr::{OcrOutcome, OcrRecord};
pub use payment::PaymentRecord;
pub use period::MembershipPeriod;
pub use types::*;
pub use vehicle::MemberVehicle;
