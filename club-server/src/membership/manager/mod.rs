//! MembershipManager - Core command processing and event generation
//!
//! This module handles:
//! - Command validation and processing
//! - Event generation with global sequence numbers
//! - Persistence to redb (transactional)
//! - Event broadcasting
//! - Post-commit OCR enrichment
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Provider pre-check (ReprocessOcr only)
//!     ├─ 2. Idempotency check (command_id)
//!     ├─ 3. Begin write transaction
//!     ├─ 4. Create CommandContext
//!     ├─ 5. Convert command to action and execute
//!     ├─ 6. Persist events
//!     ├─ 7. Advance sequence counter
//!     ├─ 8. Mark command processed
//!     ├─ 9. Commit transaction
//!     ├─ 10. Broadcast event(s)
//!     ├─ 11. Audit log operator commands
//!     ├─ 12. Schedule OCR for document commands
//!     └─ 13. Return response
//! ```

mod error;
pub use error::*;

use super::actions::CommandAction;
use super::calendar::{FeeCalendar, ResolvedFeeConfig};
use super::ocr::{DocumentOcr, NoopOcr};
use super::storage::{MembershipStorage, StorageError, StorageStats};
use super::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::audit_log;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::membership::{
    AnnualFeeConfig, ApplicationDocument, CommandPayload, CommandResponse, DocumentType,
    DomainError, EventPayload, MemberVehicle, MembershipApplication, MembershipCommand,
    MembershipEvent, MembershipEventType, MembershipPeriod, OcrRecord, PaymentRecord,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 65536;

/// MembershipManager for command processing
///
/// All state changes go through [`execute_command`](Self::execute_command):
/// one command, one write transaction, one batch of events. Reads never
/// take the write lock.
pub struct MembershipManager {
    storage: MembershipStorage,
    event_tx: broadcast::Sender<MembershipEvent>,
    /// Resolves fee calendars; synthesizes defaults for unconfigured years
    calendar: FeeCalendar,
    /// OCR provider, [`NoopOcr`] unless configured otherwise
    ocr: Arc<dyn DocumentOcr>,
    /// Club timezone, used for dated guards and application numbers
    tz: Tz,
}

impl std::fmt::Debug for MembershipManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipManager")
            .field("storage", &"<MembershipStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("ocr", &self.ocr.engine_name())
            .field("tz", &self.tz)
            .finish()
    }
}

impl MembershipManager {
    /// Create a new MembershipManager with the given database path
    pub fn new(db_path: impl AsRef<Path>, tz: Tz) -> ManagerResult<Self> {
        let storage = MembershipStorage::open(db_path)?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let ocr: Arc<dyn DocumentOcr> = Arc::new(NoopOcr);
        tracing::info!(engine = ocr.engine_name(), timezone = %tz, "MembershipManager started");
        Ok(Self {
            storage,
            event_tx,
            // Same fallback as the DEFAULT_FEE config default
            calendar: FeeCalendar::new(Decimal::from(200_000)),
            ocr,
            tz,
        })
    }

    /// Replace the fallback fee used for years without a configuration
    pub fn with_default_fee(mut self, default_fee: Decimal) -> Self {
        self.calendar = FeeCalendar::new(default_fee);
        self
    }

    /// Install an OCR provider
    pub fn with_ocr(mut self, provider: Arc<dyn DocumentOcr>) -> Self {
        self.ocr = provider;
        self
    }

    /// Create a MembershipManager with existing storage (for testing)
    #[cfg(test)]
    pub fn with_storage(storage: MembershipStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            event_tx,
            calendar: FeeCalendar::new(Decimal::from(200_000)),
            ocr: Arc::new(NoopOcr),
            tz: chrono_tz::Asia::Seoul,
        }
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<MembershipEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &MembershipStorage {
        &self.storage
    }

    /// Execute a command and return the response
    pub async fn execute_command(&self, cmd: MembershipCommand) -> CommandResponse {
        // Provider checks happen before any transaction; an explicit
        // reprocess request against a missing engine is an error, unlike
        // the silent skip on upload
        if let CommandPayload::ReprocessOcr { document_type, .. } = &cmd.payload {
            if !self.ocr.is_available() {
                return CommandResponse::error(
                    cmd.command_id,
                    ManagerError::Domain(DomainError::OcrUnavailable).into(),
                );
            }
            if !self.ocr.supports(*document_type) {
                return CommandResponse::error(
                    cmd.command_id,
                    ManagerError::Domain(DomainError::OcrUnsupported {
                        document_type: *document_type,
                    })
                    .into(),
                );
            }
        }

        match self.process_command(cmd.clone()).await {
            Ok((response, events)) => {
                // Broadcast events after successful commit
                for event in &events {
                    if self.event_tx.send(event.clone()).is_err() {
                        tracing::warn!("Event broadcast failed: no active receivers");
                        break;
                    }
                }
                if let Some(operator_id) = cmd.operator_id {
                    let resource = response
                        .entity_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    audit_log!(operator_id, cmd.payload.command_type(), resource);
                }
                self.schedule_ocr(&cmd, &events);
                response
            }
            Err(err) => CommandResponse::error(cmd.command_id, err.into()),
        }
    }

    /// Process command and return response with events
    ///
    /// Uses the action-based architecture:
    /// 1. Convert command to CommandAction
    /// 2. Execute action to generate events against the aggregates
    /// 3. Persist everything atomically
    async fn process_command(
        &self,
        cmd: MembershipCommand,
    ) -> ManagerResult<(CommandResponse, Vec<MembershipEvent>)> {
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        // 1. Idempotency check (before transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 2. Begin write transaction
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within transaction
        if self
            .storage
            .is_command_processed_txn(&txn, &cmd.command_id)?
        {
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 3. Get current sequence for context initialization
        let current_sequence = self.storage.get_current_sequence()?;

        // 4. Create context and metadata
        let mut ctx = CommandContext::new(
            &txn,
            &self.storage,
            &self.calendar,
            self.tz,
            current_sequence,
        );
        let metadata = CommandMetadata::from(&cmd);

        // 5. Convert to action and execute
        let action = CommandAction::from(&cmd);
        let events = action.execute(&mut ctx, &metadata).await?;

        // 6. Persist events
        for event in &events {
            self.storage.store_event(&txn, event)?;
        }

        // 7. Advance the sequence counter past the allocated sequences
        let final_sequence = ctx.current_sequence();
        if final_sequence > current_sequence {
            self.storage.set_sequence(&txn, final_sequence)?;
        }

        // 8. Mark command processed
        self.storage.mark_command_processed(&txn, &cmd.command_id)?;

        // 9. Commit transaction
        txn.commit().map_err(StorageError::from)?;

        // 10. Return response
        let entity_id = events.first().and_then(|e| e.payload.entity_id());
        tracing::info!(
            command_id = %cmd.command_id,
            entity_id = ?entity_id,
            event_count = events.len(),
            "Command processed successfully"
        );
        Ok((CommandResponse::success(cmd.command_id, entity_id), events))
    }

    // ========== OCR ==========

    /// Kick off the post-commit OCR pass for commands that touched a document
    ///
    /// Duplicate upload redeliveries produced no DocumentUploaded event and
    /// are skipped.
    fn schedule_ocr(&self, cmd: &MembershipCommand, events: &[MembershipEvent]) {
        let (application_id, document_type) = match &cmd.payload {
            CommandPayload::UploadDocument {
                application_id,
                document_type,
                ..
            } => {
                if !events
                    .iter()
                    .any(|e| e.event_type == MembershipEventType::DocumentUploaded)
                {
                    return;
                }
                (*application_id, *document_type)
            }
            CommandPayload::ReprocessOcr {
                application_id,
                document_type,
            } => (*application_id, *document_type),
            _ => return,
        };

        let manager = self.clone();
        let command_id = cmd.command_id.clone();
        tokio::spawn(async move {
            if let Err(e) = manager
                .run_ocr(&command_id, application_id, document_type)
                .await
            {
                tracing::error!(application_id, error = %e, "OCR run failed");
            }
        });
    }

    /// Run the configured OCR engine against one document and record the
    /// outcome.
    ///
    /// Runs after the triggering command committed and never inside its
    /// transaction: the provider call may take seconds. A missing provider
    /// skips silently; a provider failure is stored as a failed record.
    async fn run_ocr(
        &self,
        command_id: &str,
        application_id: u64,
        document_type: DocumentType,
    ) -> ManagerResult<()> {
        if !self.ocr.is_available() {
            tracing::debug!(application_id, "No OCR provider configured, skipping");
            return Ok(());
        }
        if !self.ocr.supports(document_type) {
            tracing::debug!(
                application_id,
                document_type = %document_type,
                "OCR provider does not support this document type, skipping"
            );
            return Ok(());
        }

        // Read-only loads; the provider call happens without a transaction
        let Some(application) = self.storage.get_application(application_id)? else {
            tracing::warn!(application_id, "Application vanished before OCR run");
            return Ok(());
        };
        let Some(document) = self
            .storage
            .get_document(application_id, document_type)?
        else {
            tracing::warn!(
                application_id,
                document_type = %document_type,
                "Document vanished before OCR run"
            );
            return Ok(());
        };

        let outcome = self.ocr.extract(&document, &application).await;

        // Record the outcome in its own transaction
        let txn = self.storage.begin_write()?;
        let record_id = self.storage.next_entity_id(&txn)?;
        let record = match outcome {
            Ok(outcome) => OcrRecord::from_outcome(record_id, document.id, outcome),
            Err(e) => {
                tracing::warn!(
                    application_id,
                    document_id = document.id,
                    error = %e,
                    "OCR extraction failed"
                );
                OcrRecord::from_failure(
                    record_id,
                    document.id,
                    self.ocr.engine_name().to_string(),
                    e.to_string(),
                )
            }
        };
        self.storage.store_ocr_record(&txn, &record)?;

        // Re-load inside the transaction; the upload may have been replaced
        // while the provider ran
        let Some(mut document) = self
            .storage
            .get_document_txn(&txn, application_id, document_type)?
        else {
            return Ok(());
        };
        document.attach_ocr(record_id);
        self.storage.store_document(&txn, &document)?;

        let sequence = self.storage.get_current_sequence()? + 1;
        let event = MembershipEvent::new(
            sequence,
            None,
            None,
            command_id.to_string(),
            MembershipEventType::OcrProcessed,
            EventPayload::OcrProcessed {
                application_id,
                document_id: record.document_id,
                ocr_record_id: record_id,
                success: record.success,
                is_matched: record.is_matched,
            },
        );
        self.storage.store_event(&txn, &event)?;
        self.storage.set_sequence(&txn, sequence)?;
        txn.commit().map_err(StorageError::from)?;

        if self.event_tx.send(event).is_err() {
            tracing::warn!("Event broadcast failed: no active receivers");
        }
        Ok(())
    }

    // ========== Public Query Methods ==========

    /// Get an application by id
    pub fn get_application(&self, id: u64) -> ManagerResult<Option<MembershipApplication>> {
        Ok(self.storage.get_application(id)?)
    }

    /// Get every application on record
    pub fn get_all_applications(&self) -> ManagerResult<Vec<MembershipApplication>> {
        Ok(self.storage.get_all_applications()?)
    }

    /// Get the open application for a user, if any
    pub fn get_active_application(
        &self,
        user_id: u64,
    ) -> ManagerResult<Option<MembershipApplication>> {
        match self.storage.get_active_application_id(user_id)? {
            Some(id) => Ok(self.storage.get_application(id)?),
            None => Ok(None),
        }
    }

    /// Get one document of an application
    pub fn get_document(
        &self,
        application_id: u64,
        document_type: DocumentType,
    ) -> ManagerResult<Option<ApplicationDocument>> {
        Ok(self.storage.get_document(application_id, document_type)?)
    }

    /// Get all documents uploaded for an application
    pub fn get_documents_for_application(
        &self,
        application_id: u64,
    ) -> ManagerResult<Vec<ApplicationDocument>> {
        Ok(self.storage.get_documents_for_application(application_id)?)
    }

    /// Get a payment record by id
    pub fn get_payment(&self, id: u64) -> ManagerResult<Option<PaymentRecord>> {
        Ok(self.storage.get_payment(id)?)
    }

    /// Get all payment records of a user
    pub fn get_payments_for_user(&self, user_id: u64) -> ManagerResult<Vec<PaymentRecord>> {
        Ok(self.storage.get_payments_for_user(user_id)?)
    }

    /// Whether a confirmed annual payment covers the year for this user
    pub fn is_annual_fee_paid(&self, user_id: u64, year: i32) -> ManagerResult<bool> {
        Ok(self.storage.get_confirmed_annual(user_id, year)?.is_some())
    }

    /// Whether the user can renew seamlessly into `year`: the prior year is
    /// covered and the target year is not
    pub fn can_renew(&self, user_id: u64, year: i32) -> ManagerResult<bool> {
        if self.storage.get_period_for_year(user_id, year)?.is_some() {
            return Ok(false);
        }
        Ok(self
            .storage
            .get_period_for_year(user_id, year - 1)?
            .is_some())
    }

    /// Get all membership periods of a user
    pub fn get_periods_for_user(&self, user_id: u64) -> ManagerResult<Vec<MembershipPeriod>> {
        Ok(self.storage.get_periods_for_user(user_id)?)
    }

    /// Count active periods covering the given year
    pub fn get_active_membership_count(&self, year: i32) -> ManagerResult<u64> {
        Ok(self.storage.count_active_periods(year)?)
    }

    /// Active periods ending before the given year, for the reminder job
    pub fn get_expiring_periods(&self, before_year: i32) -> ManagerResult<Vec<MembershipPeriod>> {
        Ok(self.storage.get_expiring_periods(before_year)?)
    }

    /// Get all vehicles of a user, primary first
    pub fn get_vehicles_for_user(&self, user_id: u64) -> ManagerResult<Vec<MemberVehicle>> {
        Ok(self.storage.get_vehicles_for_user(user_id)?)
    }

    /// Find the roster vehicle registered under a VIN
    pub fn get_vehicle_by_vin(&self, vin: &str) -> ManagerResult<Option<MemberVehicle>> {
        match self.storage.find_vehicle_by_vin(vin)? {
            Some(vehicle_id) => Ok(self.storage.get_vehicle(vehicle_id)?),
            None => Ok(None),
        }
    }

    /// Whether the user has a vehicle that still carries membership
    /// privileges (active or inside its post-sale grace window)
    pub fn has_active_vehicle(&self, user_id: u64) -> ManagerResult<bool> {
        Ok(self
            .storage
            .get_vehicles_for_user(user_id)?
            .iter()
            .any(|v| v.is_active_or_grace()))
    }

    /// Count roster vehicles currently inside their grace period
    pub fn get_grace_period_vehicle_count(&self) -> ManagerResult<u64> {
        Ok(self.storage.count_grace_period_vehicles()?)
    }

    /// Get a user's permanent member number, if one was ever assigned
    pub fn get_member_number(&self, user_id: u64) -> ManagerResult<Option<u32>> {
        Ok(self.storage.get_member_number(user_id)?)
    }

    /// Resolve the fee calendar for a year, synthesizing a default when
    /// none was configured
    pub fn resolve_fee_config(&self, year: i32) -> ManagerResult<ResolvedFeeConfig> {
        let explicit = self.storage.get_fee_config(year)?;
        Ok(self.calendar.resolve_from(explicit, year)?)
    }

    /// Get every explicitly configured fee calendar
    pub fn get_all_fee_configs(&self) -> ManagerResult<Vec<AnnualFeeConfig>> {
        Ok(self.storage.get_all_fee_configs()?)
    }

    /// Get a stored OCR record by id
    pub fn get_ocr_record(&self, id: u64) -> ManagerResult<Option<OcrRecord>> {
        Ok(self.storage.get_ocr_record(id)?)
    }

    /// Get storage statistics
    pub fn get_stats(&self) -> ManagerResult<StorageStats> {
        Ok(self.storage.get_stats()?)
    }

    /// Get current sequence number
    pub fn get_current_sequence(&self) -> ManagerResult<u64> {
        Ok(self.storage.get_current_sequence()?)
    }

    /// Get events since a given sequence
    pub fn get_events_since(&self, since_sequence: u64) -> ManagerResult<Vec<MembershipEvent>> {
        Ok(self.storage.get_events_since(since_sequence)?)
    }
}

// Make MembershipManager Clone-able for spawned OCR tasks
impl Clone for MembershipManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            event_tx: self.event_tx.clone(),
            calendar: self.calendar.clone(),
            ocr: self.ocr.clone(),
            tz: self.tz,
        }
    }
}

#[cfg(test)]
mod tests;
