//! ApproveApplication command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Explicit admin approval of the document set
///
/// Unlike the automatic path in VerifyDocument, this does not consult the
/// completeness gate: an admin may wave an application through when the
/// paperwork was checked outside the system.
#[derive(Debug, Clone)]
pub struct ApproveApplicationAction {
    pub application_id: u64,
}

#[async_trait]
impl CommandHandler for ApproveApplicationAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Approval is an admin act
        let admin_id = metadata.operator_id.ok_or_else(|| {
            DomainError::InvalidInput("approval requires an operator".to_string())
        })?;

        // 2. Any pre-approval document state -> DocumentApproved
        let mut application = ctx
            .storage
            .get_application_txn(ctx.txn, self.application_id)?
            .ok_or(DomainError::ApplicationNotFound(self.application_id))?;
        application.approve_documents(admin_id)?;
        ctx.storage.store_application(ctx.txn, &application)?;

        // 3. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::ApplicationApproved,
            EventPayload::ApplicationApproved {
                application_id: self.application_id,
                user_id: application.user_id,
            },
        );
        Ok(vec![event])
    }
}
