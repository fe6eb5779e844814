//! VerifyDocument command handler

use crate::membership::gate;
use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    ApplicationStatus, DocumentType, DomainError, EventPayload, MembershipEvent,
    MembershipEventType,
};

/// Mark a document verified; a fully verified set auto-approves the application
#[derive(Debug, Clone)]
pub struct VerifyDocumentAction {
    pub application_id: u64,
    pub document_type: DocumentType,
}

#[async_trait]
impl CommandHandler for VerifyDocumentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Verification is an admin act
        let admin_id = metadata.operator_id.ok_or_else(|| {
            DomainError::InvalidInput("document verification requires an operator".to_string())
        })?;

        // 2. Load the application; terminal states are out of review
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

        // 3. Verify the document
        let mut document = ctx
            .storage
            .get_document_txn(ctx.txn, self.application_id, self.document_type)?
            .ok_or(DomainError::DocumentNotFound {
                application_id: self.application_id,
                document_type: self.document_type,
            })?;
        document.verify(admin_id)?;
        ctx.storage.store_document(ctx.txn, &document)?;

        let mut events = vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::DocumentVerified,
            EventPayload::DocumentVerified {
                application_id: self.application_id,
                document_id: document.id,
                document_type: self.document_type,
            },
        )];

        // 4. A complete, fully verified set approves the application
        let documents = ctx
            .storage
            .get_documents_for_application_txn(ctx.txn, self.application_id)?;
        if gate::is_satisfied(application.category, &documents)
            && matches!(
                application.status,
                ApplicationStatus::DocumentPending
                    | ApplicationStatus::DocumentSubmitted
                    | ApplicationStatus::UnderReview
            )
        {
            application.approve_documents(admin_id)?;
            ctx.storage.store_application(ctx.txn, &application)?;
            events.push(metadata.event(
                ctx.next_sequence(),
                MembershipEventType::ApplicationApproved,
                EventPayload::ApplicationApproved {
                    application_id: self.application_id,
                    user_id: application.user_id,
                },
            ));
        }

        Ok(events)
    }
}
