//! redb-based storage layer for the membership engine
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `applications` | `application_id` | `MembershipApplication` | Application aggregates |
//! | `active_applications` | `user_id` | `application_id` | One live application per user |
//! | `application_vins` | `vin` | `application_id` | VIN uniqueness across live applications |
//! | `documents` | `(application_id, doc_type)` | `ApplicationDocument` | One slot per document type |
//! | `payments` | `payment_id` | `PaymentRecord` | Payment ledger |
//! | `confirmed_enrollments` | `application_id` | `payment_id` | At most one confirmed enrollment fee |
//! | `confirmed_annuals` | `(user_id, year)` | `payment_id` | At most one confirmed annual fee |
//! | `periods` | `period_id` | `MembershipPeriod` | Membership periods |
//! | `period_years` | `(user_id, year)` | `period_id` | One period per member-year |
//! | `fee_configs` | `target_year` | `AnnualFeeConfig` | Explicit fee calendars |
//! | `vehicles` | `vehicle_id` | `MemberVehicle` | Vehicle roster |
//! | `vehicle_vins` | `vin` | `vehicle_id` | VIN uniqueness on the roster |
//! | `ocr_records` | `record_id` | `OcrRecord` | Document OCR outcomes |
//! | `member_numbers` | `user_id` | `member_number` | Permanent member numbers |
//! | `events` | `sequence` | `MembershipEvent` | Append-only audit stream |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `counters` | name | `u64` | Sequence, entity ids, day counters |
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`, so every committed command
//! survives an unclean shutdown. The member number counter lives in the same
//! database as the aggregates, which keeps allocation atomic with completion.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::membership::{
    AnnualFeeConfig, ApplicationDocument, DocumentType, MemberVehicle, MembershipApplication,
    MembershipEvent, MembershipPeriod, OcrRecord, PaymentRecord, PeriodStatus, VehicleStatus,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Application aggregates: key = application_id, value = JSON-serialized MembershipApplication
const APPLICATIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("applications");

/// One live application per user: key = user_id, value = application_id
const ACTIVE_APPLICATIONS_TABLE: TableDefinition<u64, u64> =
    TableDefinition::new("active_applications");

/// VIN reservation for live applications: key = vin, value = application_id
const APPLICATION_VINS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("application_vins");

/// Documents: key = (application_id, document type key), value = JSON-serialized ApplicationDocument
const DOCUMENTS_TABLE: TableDefinition<(u64, &str), &[u8]> = TableDefinition::new("documents");

/// Payment ledger: key = payment_id, value = JSON-serialized PaymentRecord
const PAYMENTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("payments");

/// Confirmed enrollment fee per application: key = application_id, value = payment_id
const CONFIRMED_ENROLLMENTS_TABLE: TableDefinition<u64, u64> =
    TableDefinition::new("confirmed_enrollments");

/// Confirmed annual fee per member-year: key = (user_id, target_year), value = payment_id
const CONFIRMED_ANNUALS_TABLE: TableDefinition<(u64, i32), u64> =
    TableDefinition::new("confirmed_annuals");

/// Membership periods: key = period_id, value = JSON-serialized MembershipPeriod
const PERIODS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("periods");

/// One period per member-year: key = (user_id, year), value = period_id
const PERIOD_YEARS_TABLE: TableDefinition<(u64, i32), u64> = TableDefinition::new("period_years");

/// Explicit fee calendars: key = target_year, value = JSON-serialized AnnualFeeConfig
const FEE_CONFIGS_TABLE: TableDefinition<i32, &[u8]> = TableDefinition::new("fee_configs");

/// Vehicle roster: key = vehicle_id, value = JSON-serialized MemberVehicle
const VEHICLES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("vehicles");

/// VIN reservation on the roster: key = vin, value = vehicle_id
const VEHICLE_VINS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("vehicle_vins");

/// OCR outcomes: key = record_id, value = JSON-serialized OcrRecord
const OCR_RECORDS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("ocr_records");

/// Permanent member numbers: key = user_id, value = member_number
const MEMBER_NUMBERS_TABLE: TableDefinition<u64, u32> = TableDefinition::new("member_numbers");

/// Audit stream: key = sequence, value = JSON-serialized MembershipEvent (append-only)
const EVENTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("events");

/// Processed commands: key = command_id, value = empty (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Named counters: key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const SEQUENCE_KEY: &str = "seq";
const ENTITY_ID_KEY: &str = "entity_id";
const MEMBER_NUMBER_KEY: &str = "member_number";
const APPLICATION_DAY_PREFIX: &str = "app_seq:";

/// Member numbers start above the founding roster; the first allocation is 650
const MEMBER_NUMBER_SEED: u64 = 649;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Membership storage backed by redb
#[derive(Clone)]
pub struct MembershipStorage {
    db: Arc<Database>,
}

impl MembershipStorage {
    /// Open or create the database at the given path
    ///
    /// Seeds the sequence counter with 0 and the member number counter with
    /// 649 on first open, so the first allocated member number is 650.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(APPLICATIONS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_APPLICATIONS_TABLE)?;
            let _ = write_txn.open_table(APPLICATION_VINS_TABLE)?;
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(CONFIRMED_ENROLLMENTS_TABLE)?;
            let _ = write_txn.open_table(CONFIRMED_ANNUALS_TABLE)?;
            let _ = write_txn.open_table(PERIODS_TABLE)?;
            let _ = write_txn.open_table(PERIOD_YEARS_TABLE)?;
            let _ = write_txn.open_table(FEE_CONFIGS_TABLE)?;
            let _ = write_txn.open_table(VEHICLES_TABLE)?;
            let _ = write_txn.open_table(VEHICLE_VINS_TABLE)?;
            let _ = write_txn.open_table(OCR_RECORDS_TABLE)?;
            let _ = write_txn.open_table(MEMBER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(SEQUENCE_KEY)?.is_none() {
                counters.insert(SEQUENCE_KEY, 0u64)?;
            }
            if counters.get(MEMBER_NUMBER_KEY)?.is_none() {
                counters.insert(MEMBER_NUMBER_KEY, MEMBER_NUMBER_SEED)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current event sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set the event sequence (within transaction)
    ///
    /// Called after an action generated its events, with the last sequence
    /// it allocated.
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Counters ==========

    /// Allocate the next entity id (within transaction)
    ///
    /// A single id space covers applications, documents, payments, periods,
    /// vehicles and OCR records.
    pub fn next_entity_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(ENTITY_ID_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(ENTITY_ID_KEY, next)?;
        Ok(next)
    }

    /// Allocate the next member number (within transaction)
    ///
    /// The counter is seeded with 649, so the first call returns 650. Numbers
    /// are never reused; a user keeps the number assigned on first completion.
    pub fn next_member_number(&self, txn: &WriteTransaction) -> StorageResult<u32> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(MEMBER_NUMBER_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(MEMBER_NUMBER_SEED);
        let next = current + 1;
        table.insert(MEMBER_NUMBER_KEY, next)?;
        Ok(next as u32)
    }

    /// Allocate the next per-day application sequence (within transaction)
    ///
    /// `day_key` is the calendar day in `YYYYMMDD` form; each day counts
    /// from 1 independently.
    pub fn next_application_day_seq(
        &self,
        txn: &WriteTransaction,
        day_key: &str,
    ) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let counter_key = format!("{APPLICATION_DAY_PREFIX}{day_key}");
        let current = table
            .get(counter_key.as_str())?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(counter_key.as_str(), next)?;
        Ok(next)
    }

    // ========== Member Numbers ==========

    /// Get the permanent member number for a user
    pub fn get_member_number(&self, user_id: u64) -> StorageResult<Option<u32>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMBER_NUMBERS_TABLE)?;
        Ok(table.get(user_id)?.map(|guard| guard.value()))
    }

    /// Get the permanent member number for a user (within transaction)
    pub fn get_member_number_txn(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
    ) -> StorageResult<Option<u32>> {
        let table = txn.open_table(MEMBER_NUMBERS_TABLE)?;
        Ok(table.get(user_id)?.map(|guard| guard.value()))
    }

    /// Record the permanent member number for a user
    pub fn set_member_number(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
        member_number: u32,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(MEMBER_NUMBERS_TABLE)?;
        table.insert(user_id, member_number)?;
        Ok(())
    }

    // ========== Command Idempotency ==========

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Append an event to the audit stream
    pub fn store_event(&self, txn: &WriteTransaction, event: &MembershipEvent) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let value = serde_json::to_vec(event)?;
        table.insert(event.sequence, value.as_slice())?;
        Ok(())
    }

    /// Get events after a given sequence, in order
    pub fn get_events_since(&self, since_sequence: u64) -> StorageResult<Vec<MembershipEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((since_sequence + 1)..)? {
            let (_key, value) = result?;
            let event: MembershipEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }
        Ok(events)
    }

    // ========== Applications ==========

    /// Store an application aggregate
    pub fn store_application(
        &self,
        txn: &WriteTransaction,
        application: &MembershipApplication,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(APPLICATIONS_TABLE)?;
        let value = serde_json::to_vec(application)?;
        table.insert(application.id, value.as_slice())?;
        Ok(())
    }

    /// Get an application by id
    pub fn get_application(&self, id: u64) -> StorageResult<Option<MembershipApplication>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(APPLICATIONS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an application by id (within transaction)
    pub fn get_application_txn(
        &self,
        txn: &WriteTransaction,
        id: u64,
    ) -> StorageResult<Option<MembershipApplication>> {
        let table = txn.open_table(APPLICATIONS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all applications
    pub fn get_all_applications(&self) -> StorageResult<Vec<MembershipApplication>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(APPLICATIONS_TABLE)?;

        let mut applications = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            applications.push(serde_json::from_slice(value.value())?);
        }
        Ok(applications)
    }

    /// Record the live application for a user
    pub fn set_active_application(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
        application_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_APPLICATIONS_TABLE)?;
        table.insert(user_id, application_id)?;
        Ok(())
    }

    /// Drop the live-application marker for a user
    pub fn clear_active_application(&self, txn: &WriteTransaction, user_id: u64) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_APPLICATIONS_TABLE)?;
        table.remove(user_id)?;
        Ok(())
    }

    /// Get the live application id for a user
    pub fn get_active_application_id(&self, user_id: u64) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_APPLICATIONS_TABLE)?;
        Ok(table.get(user_id)?.map(|guard| guard.value()))
    }

    /// Get the live application id for a user (within transaction)
    pub fn get_active_application_id_txn(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(ACTIVE_APPLICATIONS_TABLE)?;
        Ok(table.get(user_id)?.map(|guard| guard.value()))
    }

    /// Reserve a VIN for a live application
    pub fn reserve_application_vin(
        &self,
        txn: &WriteTransaction,
        vin: &str,
        application_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(APPLICATION_VINS_TABLE)?;
        table.insert(vin, application_id)?;
        Ok(())
    }

    /// Release a VIN reservation
    pub fn release_application_vin(&self, txn: &WriteTransaction, vin: &str) -> StorageResult<()> {
        let mut table = txn.open_table(APPLICATION_VINS_TABLE)?;
        table.remove(vin)?;
        Ok(())
    }

    /// Find the live application holding a VIN
    pub fn find_application_by_vin(&self, vin: &str) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(APPLICATION_VINS_TABLE)?;
        Ok(table.get(vin)?.map(|guard| guard.value()))
    }

    /// Find the live application holding a VIN (within transaction)
    pub fn find_application_by_vin_txn(
        &self,
        txn: &WriteTransaction,
        vin: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(APPLICATION_VINS_TABLE)?;
        Ok(table.get(vin)?.map(|guard| guard.value()))
    }

    // ========== Documents ==========

    /// Store a document (one slot per type and application)
    pub fn store_document(
        &self,
        txn: &WriteTransaction,
        document: &ApplicationDocument,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(DOCUMENTS_TABLE)?;
        let key = (document.application_id, document.document_type.as_str());
        let value = serde_json::to_vec(document)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get a document by application and type
    pub fn get_document(
        &self,
        application_id: u64,
        document_type: DocumentType,
    ) -> StorageResult<Option<ApplicationDocument>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        match table.get((application_id, document_type.as_str()))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a document by application and type (within transaction)
    pub fn get_document_txn(
        &self,
        txn: &WriteTransaction,
        application_id: u64,
        document_type: DocumentType,
    ) -> StorageResult<Option<ApplicationDocument>> {
        let table = txn.open_table(DOCUMENTS_TABLE)?;
        match table.get((application_id, document_type.as_str()))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get every document uploaded for an application
    ///
    /// Probes the closed set of document types instead of a range scan.
    pub fn get_documents_for_application(
        &self,
        application_id: u64,
    ) -> StorageResult<Vec<ApplicationDocument>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;

        let mut documents = Vec::new();
        for doc_type in DocumentType::ALL {
            if let Some(value) = table.get((application_id, doc_type.as_str()))? {
                documents.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(documents)
    }

    /// Get every document uploaded for an application (within transaction)
    pub fn get_documents_for_application_txn(
        &self,
        txn: &WriteTransaction,
        application_id: u64,
    ) -> StorageResult<Vec<ApplicationDocument>> {
        let table = txn.open_table(DOCUMENTS_TABLE)?;

        let mut documents = Vec::new();
        for doc_type in DocumentType::ALL {
            if let Some(value) = table.get((application_id, doc_type.as_str()))? {
                documents.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(documents)
    }

    // ========== Payments ==========

    /// Store a payment record
    pub fn store_payment(&self, txn: &WriteTransaction, payment: &PaymentRecord) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENTS_TABLE)?;
        let value = serde_json::to_vec(payment)?;
        table.insert(payment.id, value.as_slice())?;
        Ok(())
    }

    /// Get a payment by id
    pub fn get_payment(&self, id: u64) -> StorageResult<Option<PaymentRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a payment by id (within transaction)
    pub fn get_payment_txn(
        &self,
        txn: &WriteTransaction,
        id: u64,
    ) -> StorageResult<Option<PaymentRecord>> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all payments of a user, newest first
    pub fn get_payments_for_user(&self, user_id: u64) -> StorageResult<Vec<PaymentRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;

        let mut payments: Vec<PaymentRecord> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let payment: PaymentRecord = serde_json::from_slice(value.value())?;
            if payment.user_id == user_id {
                payments.push(payment);
            }
        }
        payments.sort_by_key(|p| std::cmp::Reverse(p.created_at));
        Ok(payments)
    }

    /// Claim the confirmed-enrollment slot of an application
    pub fn set_confirmed_enrollment(
        &self,
        txn: &WriteTransaction,
        application_id: u64,
        payment_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(CONFIRMED_ENROLLMENTS_TABLE)?;
        table.insert(application_id, payment_id)?;
        Ok(())
    }

    /// Get the confirmed enrollment payment of an application
    pub fn get_confirmed_enrollment(&self, application_id: u64) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONFIRMED_ENROLLMENTS_TABLE)?;
        Ok(table.get(application_id)?.map(|guard| guard.value()))
    }

    /// Get the confirmed enrollment payment of an application (within transaction)
    pub fn get_confirmed_enrollment_txn(
        &self,
        txn: &WriteTransaction,
        application_id: u64,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(CONFIRMED_ENROLLMENTS_TABLE)?;
        Ok(table.get(application_id)?.map(|guard| guard.value()))
    }

    /// Free the confirmed-enrollment slot (after refund or cancellation)
    pub fn clear_confirmed_enrollment(
        &self,
        txn: &WriteTransaction,
        application_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(CONFIRMED_ENROLLMENTS_TABLE)?;
        table.remove(application_id)?;
        Ok(())
    }

    /// Claim the confirmed-annual slot of a member-year
    pub fn set_confirmed_annual(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
        year: i32,
        payment_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(CONFIRMED_ANNUALS_TABLE)?;
        table.insert((user_id, year), payment_id)?;
        Ok(())
    }

    /// Get the confirmed annual payment of a member-year
    pub fn get_confirmed_annual(&self, user_id: u64, year: i32) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONFIRMED_ANNUALS_TABLE)?;
        Ok(table.get((user_id, year))?.map(|guard| guard.value()))
    }

    /// Get the confirmed annual payment of a member-year (within transaction)
    pub fn get_confirmed_annual_txn(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
        year: i32,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(CONFIRMED_ANNUALS_TABLE)?;
        Ok(table.get((user_id, year))?.map(|guard| guard.value()))
    }

    /// Free the confirmed-annual slot (after refund or cancellation)
    pub fn clear_confirmed_annual(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
        year: i32,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(CONFIRMED_ANNUALS_TABLE)?;
        table.remove((user_id, year))?;
        Ok(())
    }

    // ========== Periods ==========

    /// Store a membership period
    pub fn store_period(&self, txn: &WriteTransaction, period: &MembershipPeriod) -> StorageResult<()> {
        let mut table = txn.open_table(PERIODS_TABLE)?;
        let value = serde_json::to_vec(period)?;
        table.insert(period.id, value.as_slice())?;
        Ok(())
    }

    /// Get a period by id
    pub fn get_period(&self, id: u64) -> StorageResult<Option<MembershipPeriod>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PERIODS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a period by id (within transaction)
    pub fn get_period_txn(
        &self,
        txn: &WriteTransaction,
        id: u64,
    ) -> StorageResult<Option<MembershipPeriod>> {
        let table = txn.open_table(PERIODS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Record the period covering a member-year
    pub fn set_period_year(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
        year: i32,
        period_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PERIOD_YEARS_TABLE)?;
        table.insert((user_id, year), period_id)?;
        Ok(())
    }

    /// Get the period covering a member-year
    pub fn get_period_for_year(&self, user_id: u64, year: i32) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PERIOD_YEARS_TABLE)?;
        Ok(table.get((user_id, year))?.map(|guard| guard.value()))
    }

    /// Get the period covering a member-year (within transaction)
    pub fn get_period_for_year_txn(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
        year: i32,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(PERIOD_YEARS_TABLE)?;
        Ok(table.get((user_id, year))?.map(|guard| guard.value()))
    }

    /// Get all periods of a user, oldest first
    pub fn get_periods_for_user(&self, user_id: u64) -> StorageResult<Vec<MembershipPeriod>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PERIODS_TABLE)?;

        let mut periods: Vec<MembershipPeriod> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let period: MembershipPeriod = serde_json::from_slice(value.value())?;
            if period.user_id == user_id {
                periods.push(period);
            }
        }
        periods.sort_by_key(|p| p.start_year);
        Ok(periods)
    }

    /// Count active periods covering a year
    pub fn count_active_periods(&self, year: i32) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PERIODS_TABLE)?;

        let mut count = 0;
        for result in table.iter()? {
            let (_key, value) = result?;
            let period: MembershipPeriod = serde_json::from_slice(value.value())?;
            if period.status == PeriodStatus::Active && period.covers_year(year) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Get active periods that end before the given year
    ///
    /// These are the members whose coverage has lapsed and who are candidates
    /// for expiration (and an expiration notice).
    pub fn get_expiring_periods(&self, before_year: i32) -> StorageResult<Vec<MembershipPeriod>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PERIODS_TABLE)?;

        let mut periods: Vec<MembershipPeriod> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let period: MembershipPeriod = serde_json::from_slice(value.value())?;
            if period.status == PeriodStatus::Active && period.end_year < before_year {
                periods.push(period);
            }
        }
        periods.sort_by_key(|p| (p.end_year, p.id));
        Ok(periods)
    }

    // ========== Fee Configs ==========

    /// Store a fee calendar
    pub fn store_fee_config(
        &self,
        txn: &WriteTransaction,
        config: &AnnualFeeConfig,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(FEE_CONFIGS_TABLE)?;
        let value = serde_json::to_vec(config)?;
        table.insert(config.target_year, value.as_slice())?;
        Ok(())
    }

    /// Get the explicit fee calendar for a year
    pub fn get_fee_config(&self, year: i32) -> StorageResult<Option<AnnualFeeConfig>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FEE_CONFIGS_TABLE)?;
        match table.get(year)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get the explicit fee calendar for a year (within transaction)
    pub fn get_fee_config_txn(
        &self,
        txn: &WriteTransaction,
        year: i32,
    ) -> StorageResult<Option<AnnualFeeConfig>> {
        let table = txn.open_table(FEE_CONFIGS_TABLE)?;
        match table.get(year)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all explicit fee calendars, oldest year first
    pub fn get_all_fee_configs(&self) -> StorageResult<Vec<AnnualFeeConfig>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FEE_CONFIGS_TABLE)?;

        let mut configs = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            configs.push(serde_json::from_slice(value.value())?);
        }
        Ok(configs)
    }

    // ========== Vehicles ==========

    /// Store a roster vehicle
    pub fn store_vehicle(&self, txn: &WriteTransaction, vehicle: &MemberVehicle) -> StorageResult<()> {
        let mut table = txn.open_table(VEHICLES_TABLE)?;
        let value = serde_json::to_vec(vehicle)?;
        table.insert(vehicle.id, value.as_slice())?;
        Ok(())
    }

    /// Get a vehicle by id
    pub fn get_vehicle(&self, id: u64) -> StorageResult<Option<MemberVehicle>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VEHICLES_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a vehicle by id (within transaction)
    pub fn get_vehicle_txn(
        &self,
        txn: &WriteTransaction,
        id: u64,
    ) -> StorageResult<Option<MemberVehicle>> {
        let table = txn.open_table(VEHICLES_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Delete a vehicle row (the VIN reservation is released separately)
    pub fn remove_vehicle(&self, txn: &WriteTransaction, id: u64) -> StorageResult<()> {
        let mut table = txn.open_table(VEHICLES_TABLE)?;
        table.remove(id)?;
        Ok(())
    }

    /// Get all vehicles of a user, primary first
    pub fn get_vehicles_for_user(&self, user_id: u64) -> StorageResult<Vec<MemberVehicle>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VEHICLES_TABLE)?;

        let mut vehicles: Vec<MemberVehicle> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let vehicle: MemberVehicle = serde_json::from_slice(value.value())?;
            if vehicle.user_id == user_id {
                vehicles.push(vehicle);
            }
        }
        vehicles.sort_by_key(|v| (!v.is_primary, v.registered_at));
        Ok(vehicles)
    }

    /// Get the current primary vehicle of a user (within transaction)
    pub fn get_primary_vehicle_txn(
        &self,
        txn: &WriteTransaction,
        user_id: u64,
    ) -> StorageResult<Option<MemberVehicle>> {
        let table = txn.open_table(VEHICLES_TABLE)?;

        for result in table.iter()? {
            let (_key, value) = result?;
            let vehicle: MemberVehicle = serde_json::from_slice(value.value())?;
            if vehicle.user_id == user_id && vehicle.is_primary {
                return Ok(Some(vehicle));
            }
        }
        Ok(None)
    }

    /// Reserve a VIN on the roster
    pub fn reserve_vehicle_vin(
        &self,
        txn: &WriteTransaction,
        vin: &str,
        vehicle_id: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(VEHICLE_VINS_TABLE)?;
        table.insert(vin, vehicle_id)?;
        Ok(())
    }

    /// Release a roster VIN reservation
    pub fn release_vehicle_vin(&self, txn: &WriteTransaction, vin: &str) -> StorageResult<()> {
        let mut table = txn.open_table(VEHICLE_VINS_TABLE)?;
        table.remove(vin)?;
        Ok(())
    }

    /// Find the roster vehicle holding a VIN
    pub fn find_vehicle_by_vin(&self, vin: &str) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VEHICLE_VINS_TABLE)?;
        Ok(table.get(vin)?.map(|guard| guard.value()))
    }

    /// Find the roster vehicle holding a VIN (within transaction)
    pub fn find_vehicle_by_vin_txn(
        &self,
        txn: &WriteTransaction,
        vin: &str,
    ) -> StorageResult<Option<u64>> {
        let table = txn.open_table(VEHICLE_VINS_TABLE)?;
        Ok(table.get(vin)?.map(|guard| guard.value()))
    }

    /// Count vehicles currently inside their post-sale grace period
    pub fn count_grace_period_vehicles(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VEHICLES_TABLE)?;

        let mut count = 0;
        for result in table.iter()? {
            let (_key, value) = result?;
            let vehicle: MemberVehicle = serde_json::from_slice(value.value())?;
            if vehicle.status == VehicleStatus::GracePeriod {
                count += 1;
            }
        }
        Ok(count)
    }

    // ========== OCR Records ==========

    /// Store an OCR outcome record
    pub fn store_ocr_record(&self, txn: &WriteTransaction, record: &OcrRecord) -> StorageResult<()> {
        let mut table = txn.open_table(OCR_RECORDS_TABLE)?;
        let value = serde_json::to_vec(record)?;
        table.insert(record.id, value.as_slice())?;
        Ok(())
    }

    /// Get an OCR record by id
    pub fn get_ocr_record(&self, id: u64) -> StorageResult<Option<OcrRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OCR_RECORDS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let applications_table = read_txn.open_table(APPLICATIONS_TABLE)?;
        let documents_table = read_txn.open_table(DOCUMENTS_TABLE)?;
        let payments_table = read_txn.open_table(PAYMENTS_TABLE)?;
        let periods_table = read_txn.open_table(PERIODS_TABLE)?;
        let vehicles_table = read_txn.open_table(VEHICLES_TABLE)?;
        let events_table = read_txn.open_table(EVENTS_TABLE)?;
        let commands_table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        let counters_table = read_txn.open_table(COUNTERS_TABLE)?;

        Ok(StorageStats {
            application_count: applications_table.len()?,
            document_count: documents_table.len()?,
            payment_count: payments_table.len()?,
            period_count: periods_table.len()?,
            vehicle_count: vehicles_table.len()?,
            event_count: events_table.len()?,
            processed_command_count: commands_table.len()?,
            current_sequence: counters_table
                .get(SEQUENCE_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub application_count: u64,
    pub document_count: u64,
    pub payment_count: u64,
    pub period_count: u64,
    pub vehicle_count: u64,
    pub event_count: u64,
    pub processed_command_count: u64,
    pub current_sequence: u64,
}
