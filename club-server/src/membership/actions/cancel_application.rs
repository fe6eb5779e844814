//! CancelApplication command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Withdraw an application and release its slots
#[derive(Debug, Clone)]
pub struct CancelApplicationAction {
    pub application_id: u64,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for CancelApplicationAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Any non-terminal state -> Cancelled
        let mut application = ctx
            .storage
            .get_application_txn(ctx.txn, self.application_id)?
            .ok_or(DomainError::ApplicationNotFound(self.application_id))?;
        application.cancel(self.reason.clone())?;
        ctx.storage.store_application(ctx.txn, &application)?;

        // 2. Release the per-user slot and the VIN so the user can reapply
        ctx.storage
            .clear_active_application(ctx.txn, application.user_id)?;
        ctx.storage
            .release_application_vin(ctx.txn, &application.vehicle.vin)?;

        // 3. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::ApplicationCancelled,
            EventPayload::ApplicationCancelled {
                application_id: self.application_id,
                user_id: application.user_id,
                reason: self.reason.clone(),
            },
        );
        Ok(vec![event])
    }
}
