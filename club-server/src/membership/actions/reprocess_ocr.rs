//! ReprocessOcr command handler
//!
//! The transactional part only validates that the target document exists.
//! The manager checks provider availability before opening the transaction
//! and runs the extraction after commit, so the write path never waits on
//! an external engine.

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DocumentType, DomainError, MembershipEvent};

/// Queue a document for another OCR pass
#[derive(Debug, Clone)]
pub struct ReprocessOcrAction {
    pub application_id: u64,
    pub document_type: DocumentType,
}

#[async_trait]
impl CommandHandler for ReprocessOcrAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. The application and the document must both exist
        ctx.storage
            .get_application_txn(ctx.txn, self.application_id)?
            .ok_or(DomainError::ApplicationNotFound(self.application_id))?;
        ctx.storage
            .get_document_txn(ctx.txn, self.application_id, self.document_type)?
            .ok_or(DomainError::DocumentNotFound {
                application_id: self.application_id,
                document_type: self.document_type,
            })?;

        // 2. No state changes here; the OcrProcessed event is recorded by
        //    the post-commit extraction
        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::calendar::FeeCalendar;
    use crate::membership::manager::ManagerError;
    use crate::membership::storage::MembershipStorage;
    use rust_decimal::Decimal;
    use shared::membership::{
        ApplicantSnapshot, ApplicationDocument, FileReference, MembershipApplication,
        OwnershipCategory, VehicleSnapshot,
    };

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "test-cmd-1".to_string(),
            operator_id: Some(7),
            operator_name: Some("Admin Lee".to_string()),
            timestamp: 0,
        }
    }

    fn seed_application_with_document(storage: &MembershipStorage) -> u64 {
        let txn = storage.begin_write().unwrap();
        let app_id = storage.next_entity_id(&txn).unwrap();
        let app = MembershipApplication::new(
            app_id,
            100,
            "APP-20250110-00001".to_string(),
            OwnershipCategory::Personal,
            ApplicantSnapshot {
                real_name: "Kim Minjun".to_string(),
                phone_number: "010-1234-5678".to_string(),
                email: "minjun@example.com".to_string(),
            },
            VehicleSnapshot {
                plate_number: "12가3456".to_string(),
                vin: "WP0ZZZ99ZTS392124".to_string(),
                model_name: "911 Carrera".to_string(),
            },
        );
        storage.store_application(&txn, &app).unwrap();

        let doc_id = storage.next_entity_id(&txn).unwrap();
        let doc = ApplicationDocument::new(
            doc_id,
            app_id,
            DocumentType::VehicleRegistration,
            FileReference {
                url: "https://files.example.com/registration.pdf".to_string(),
                original_name: "registration.pdf".to_string(),
                size: 1024,
                content_type: "application/pdf".to_string(),
            },
        );
        storage.store_document(&txn, &doc).unwrap();
        txn.commit().unwrap();
        app_id
    }

    async fn reprocess(
        storage: &MembershipStorage,
        application_id: u64,
        document_type: DocumentType,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage, &calendar, chrono_tz::Asia::Seoul, 0);
        let action = ReprocessOcrAction {
            application_id,
            document_type,
        };
        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        if result.is_ok() {
            txn.commit().unwrap();
        }
        result
    }

    #[tokio::test]
    async fn test_reprocess_emits_nothing_in_transaction() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let app_id = seed_application_with_document(&storage);

        let events = reprocess(&storage, app_id, DocumentType::VehicleRegistration)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_reprocess_missing_document_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let app_id = seed_application_with_document(&storage);

        let result = reprocess(&storage, app_id, DocumentType::IdCard).await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::DocumentNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_reprocess_missing_application_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();

        let result = reprocess(&storage, 42, DocumentType::VehicleRegistration).await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::ApplicationNotFound(42)))
        ));
    }
}
