//! StartReview command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// An admin picks up a submitted document set for review
#[derive(Debug, Clone)]
pub struct StartReviewAction {
    pub application_id: u64,
}

#[async_trait]
impl CommandHandler for StartReviewAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Review is an admin act
        let admin_id = metadata.operator_id.ok_or_else(|| {
            DomainError::InvalidInput("review requires an operator".to_string())
        })?;

        // 2. DocumentSubmitted -> UnderReview
        let mut application = ctx
            .storage
            .get_application_txn(ctx.txn, self.application_id)?
            .ok_or(DomainError::ApplicationNotFound(self.application_id))?;
        application.start_review(admin_id)?;
        ctx.storage.store_application(ctx.txn, &application)?;

        // 3. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::ReviewStarted,
            EventPayload::ReviewStarted {
                application_id: self.application_id,
            },
        );
        Ok(vec![event])
    }
}
