//! UploadDocument command handler

use crate::membership::gate;
use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    ApplicationDocument, ApplicationStatus, DocumentType, DomainError, EventPayload, FileReference,
    MembershipEvent, MembershipEventType,
};

/// Attach a document to an application, or replace a rejected one
#[derive(Debug, Clone)]
pub struct UploadDocumentAction {
    pub application_id: u64,
    pub document_type: DocumentType,
    pub file: FileReference,
}

#[async_trait]
impl CommandHandler for UploadDocumentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Load the application; terminal states accept no more documents
        let mut application = ctx
            .storage
            .get_application_txn(ctx.txn, self.application_id)?
            .ok_or(DomainError::ApplicationNotFound(self.application_id))?;
        if application.is_terminal() {
            return Err(DomainError::TerminalApplication {
                status: application.status,
            }
            .into());
        }

        // 2. One slot per type; only a rejected upload may be replaced
        let existing = ctx
            .storage
            .get_document_txn(ctx.txn, self.application_id, self.document_type)?;
        let (document, replaced) = match existing {
            Some(mut document) if document.is_rejected() => {
                document.replace_file(self.file.clone());
                (document, true)
            }
            Some(_) => {
                return Err(DomainError::DuplicateDocumentType {
                    doc_type: self.document_type,
                }
                .into());
            }
            None => {
                let id = ctx.storage.next_entity_id(ctx.txn)?;
                (
                    ApplicationDocument::new(id, self.application_id, self.document_type, self.file.clone()),
                    false,
                )
            }
        };
        ctx.storage.store_document(ctx.txn, &document)?;

        // 3. Reaching the required distinct-type count moves the application
        //    out of DocumentPending or DocumentRejected
        let documents = ctx
            .storage
            .get_documents_for_application_txn(ctx.txn, self.application_id)?;
        if gate::all_required_submitted(application.category, &documents)
            && matches!(
                application.status,
                ApplicationStatus::DocumentPending | ApplicationStatus::DocumentRejected
            )
        {
            application.submit_documents()?;
            ctx.storage.store_application(ctx.txn, &application)?;
        }

        // 4. Emit the upload event
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::DocumentUploaded,
            EventPayload::DocumentUploaded {
                application_id: self.application_id,
                document_id: document.id,
                document_type: self.document_type,
                replaced,
            },
        );
        Ok(vec![event])
    }
}
