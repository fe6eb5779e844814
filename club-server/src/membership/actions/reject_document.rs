//! RejectDocument command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    ApplicationStatus, DocumentType, DomainError, EventPayload, MembershipEvent,
    MembershipEventType,
};

/// Refuse a document; the application drops to DocumentRejected with it
#[derive(Debug, Clone)]
pub struct RejectDocumentAction {
    pub application_id: u64,
    pub document_type: DocumentType,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for RejectDocumentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Rejection is an admin act
        let admin_id = metadata.operator_id.ok_or_else(|| {
            DomainError::InvalidInput("document rejection requires an operator".to_string())
        })?;

        // 2. Load the application; rejection must not resurrect a cancelled one
        let mut application = ctx
            .storage
            .get_application_txn(ctx.txn, self.application_id)?
            .ok_or(DomainError::ApplicationNotFound(self.application_id))?;
        if application.status == ApplicationStatus::Cancelled {
            return Err(DomainError::TerminalApplication {
                status: ApplicationStatus::Cancelled,
            }
            .into());
        }

        // 3. The application falls back to DocumentRejected (fails on Completed)
        application.reject_documents(self.reason.clone(), admin_id)?;

        // 4. Refuse the document itself
        let mut document = ctx
            .storage
            .get_document_txn(ctx.txn, self.application_id, self.document_type)?
            .ok_or(DomainError::DocumentNotFound {
                application_id: self.application_id,
                document_type: self.document_type,
            })?;
        document.reject(self.reason.clone(), admin_id);

        ctx.storage.store_document(ctx.txn, &document)?;
        ctx.storage.store_application(ctx.txn, &application)?;

        // 5. Emit both rejection events
        let events = vec![
            metadata.event(
                ctx.next_sequence(),
                MembershipEventType::DocumentRejected,
                EventPayload::DocumentRejected {
                    application_id: self.application_id,
                    document_id: document.id,
                    document_type: self.document_type,
                    reason: self.reason.clone(),
                },
            ),
            metadata.event(
                ctx.next_sequence(),
                MembershipEventType::ApplicationRejected,
                EventPayload::ApplicationRejected {
                    application_id: self.application_id,
                    user_id: application.user_id,
                    reason: self.reason.clone(),
                },
            ),
        ];
        Ok(events)
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
            command_id: "test-cmd".to_string(),
            operator_id: Some(7),
            operator_name: Some("Admin Lee".to_string()),
            timestamp: 0,
        }
    }

    fn seed_submitted_application(storage: &MembershipStorage) -> u64 {
        let txn = storage.begin_write().unwrap();
        let id = storage.next_entity_id(&txn).unwrap();
        let mut app = MembershipApplication::new(
            id,
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
        for doc_type in [DocumentType::VehicleRegistration, DocumentType::IdCard] {
            let doc_id = storage.next_entity_id(&txn).unwrap();
            let doc = ApplicationDocument::new(
                doc_id,
                id,
                doc_type,
                FileReference {
                    url: "https://files.example.com/doc.pdf".to_string(),
                    original_name: "doc.pdf".to_string(),
                    size: 1024,
                    content_type: "application/pdf".to_string(),
                },
            );
            storage.store_document(&txn, &doc).unwrap();
        }
        app.submit_documents().unwrap();
        storage.store_application(&txn, &app).unwrap();
        txn.commit().unwrap();
        id
    }

    async fn reject(
        storage: &MembershipStorage,
        application_id: u64,
        document_type: DocumentType,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage, &calendar, chrono_tz::Asia::Seoul, 0);
        let action = RejectDocumentAction {
            application_id,
            document_type,
            reason: "Blurry scan".to_string(),
        };
        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        if result.is_ok() {
            txn.commit().unwrap();
        }
        result
    }

    #[tokio::test]
    async fn test_reject_document_drops_application() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let app_id = seed_submitted_application(&storage);

        let events = reject(&storage, app_id, DocumentType::IdCard).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, MembershipEventType::DocumentRejected);
        assert_eq!(events[1].event_type, MembershipEventType::ApplicationRejected);

        let app = storage.get_application(app_id).unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::DocumentRejected);
        assert_eq!(app.rejection_reason.as_deref(), Some("Blurry scan"));

        let doc = storage.get_document(app_id, DocumentType::IdCard).unwrap().unwrap();
        assert!(doc.is_rejected());
    }

    #[tokio::test]
    async fn test_reject_cancelled_application_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let app_id = seed_submitted_application(&storage);

        let txn = storage.begin_write().unwrap();
        let mut app = storage.get_application_txn(&txn, app_id).unwrap().unwrap();
        app.cancel(None).unwrap();
        storage.store_application(&txn, &app).unwrap();
        txn.commit().unwrap();

        let result = reject(&storage, app_id, DocumentType::IdCard).await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::TerminalApplication {
                status: ApplicationStatus::Cancelled
            }))
        ));
    }

    #[tokio::test]
    async fn test_reject_missing_document_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let app_id = seed_submitted_application(&storage);

        let result = reject(&storage, app_id, DocumentType::RentalContract).await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::DocumentNotFound { .. }))
        ));

        // Failed rejection leaves the application untouched
        let app = storage.get_application(app_id).unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::DocumentSubmitted);
    }
}
