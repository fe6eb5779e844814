//! RejectApplication command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    ApplicationStatus, DomainError, EventPayload, MembershipEvent, MembershipEventType,
};

/// Turn an application down without pointing at a single document
#[derive(Debug, Clone)]
pub struct RejectApplicationAction {
    pub application_id: u64,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for RejectApplicationAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Rejection is an admin act
        let admin_id = metadata.operator_id.ok_or_else(|| {
            DomainError::InvalidInput("rejection requires an operator".to_string())
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

        // 3. Any status except Completed -> DocumentRejected
        application.reject_documents(self.reason.clone(), admin_id)?;
        ctx.storage.store_application(ctx.txn, &application)?;

        // 4. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::ApplicationRejected,
            EventPayload::ApplicationRejected {
                application_id: self.application_id,
                user_id: application.user_id,
                reason: self.reason.clone(),
            },
        );
        Ok(vec![event])
    }
}
