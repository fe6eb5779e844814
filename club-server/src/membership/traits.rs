//! Command execution seam
//!
//! Every lifecycle operation implements [`CommandHandler`]: it receives a
//! [`CommandContext`] scoped to one open write transaction, mutates aggregates
//! through their own methods, and returns the events describing what happened.
//! The manager owns the transaction; an error from a handler aborts it, so a
//! failed command leaves no partial state behind.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use redb::WriteTransaction;
use shared::membership::{EventPayload, MembershipCommand, MembershipEvent, MembershipEventType};

use super::calendar::FeeCalendar;
use super::manager::ManagerResult;
use super::storage::MembershipStorage;

/// Per-command execution context
///
/// Borrows the open write transaction and hands out event sequence numbers.
/// `sequence` starts at the last committed value; [`CommandContext::next_sequence`]
/// pre-increments, and the manager persists the final value after the handler
/// returns.
pub struct CommandContext<'a> {
    pub txn: &'a WriteTransaction,
    pub storage: &'a MembershipStorage,
    pub calendar: &'a FeeCalendar,
    tz: Tz,
    sequence: u64,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a MembershipStorage,
        calendar: &'a FeeCalendar,
        tz: Tz,
        current_sequence: u64,
    ) -> Self {
        Self {
            txn,
            storage,
            calendar,
            tz,
            sequence: current_sequence,
        }
    }

    /// Allocate the next event sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Highest sequence number allocated so far
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Today's calendar date in the configured timezone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// The current year in the configured timezone
    pub fn current_year(&self) -> i32 {
        self.today().year()
    }
}

/// Command metadata carried into every handler
///
/// Extracted from the envelope so handlers never touch the payload of a
/// foreign command type.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub operator_id: Option<u64>,
    pub operator_name: Option<String>,
    pub timestamp: i64,
}

impl CommandMetadata {
    /// Build an event attributed to this command and its operator
    pub fn event(
        &self,
        sequence: u64,
        event_type: MembershipEventType,
        payload: EventPayload,
    ) -> MembershipEvent {
        MembershipEvent::new(
            sequence,
            self.operator_id,
            self.operator_name.clone(),
            self.command_id.clone(),
            event_type,
            payload,
        )
    }
}

impl From<&MembershipCommand> for CommandMetadata {
    fn from(command: &MembershipCommand) -> Self {
        Self {
            command_id: command.command_id.clone(),
            operator_id: command.operator_id,
            operator_name: command.operator_name.clone(),
            timestamp: command.timestamp,
        }
    }
}

/// One lifecycle operation
///
/// Handlers are synchronous in practice; the async signature exists so the
/// dispatch enum and the manager share one calling convention.
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>>;
}
