//! Membership Lifecycle Module
//!
//! This module implements the club's membership engine:
//!
//! - **manager**: Core MembershipManager for command processing and event generation
//! - **storage**: redb-based persistence layer for aggregates, slots, and the event stream
//! - **actions**: One command handler per operation
//! - **gate**: Document completeness rules per ownership category
//! - **calendar**: Annual fee calendar resolution and carry-over dating
//! - **ocr**: Pluggable document extraction seam
//! - **orchestrator**: Event-driven lifecycle follow-ups
//!
//! # Architecture
//!
//! ```text
//! Command → MembershipManager → Aggregates + Events → Storage (redb)
//!                 ↓
//!              Broadcast
//!                 ↓
//!        LifecycleOrchestrator → follow-up Command
//! ```
//!
//! # Data Flow
//!
//! 1. Caller sends MembershipCommand to the manager
//! 2. MembershipManager checks idempotency and runs the matching action
//! 3. The action mutates aggregates and yields events, all in one transaction
//! 4. Events are persisted with global sequence numbers and broadcast
//! 5. The orchestrator reacts to confirmed payments with derived commands
//! 6. CommandResponse is returned to the caller

pub mod actions;
pub mod calendar;
pub mod gate;
pub mod manager;
pub mod ocr;
pub mod orchestrator;
pub mod storage;
pub mod traits;

// Re-exports
pub use calendar::{FeeCalendar, ResolvedFeeConfig};
pub use manager::{ManagerError, ManagerResult, MembershipManager};
pub use ocr::{DocumentOcr, NoopOcr, OcrError};
pub use orchestrator::LifecycleOrchestrator;
pub use storage::{MembershipStorage, StorageStats};

// Re-export shared types for convenience
pub use shared::membership::{
    CommandError, CommandPayload, CommandResponse, EventPayload, MembershipCommand,
    MembershipEvent, MembershipEventType,
};
