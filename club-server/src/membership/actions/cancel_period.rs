//! CancelPeriod command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Void a membership period, typically after its payment was cancelled or
/// refunded
#[derive(Debug, Clone)]
pub struct CancelPeriodAction {
    pub period_id: u64,
}

#[async_trait]
impl CommandHandler for CancelPeriodAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Load the period
        let mut period = ctx
            .storage
            .get_period_txn(ctx.txn, self.period_id)?
            .ok_or(DomainError::PeriodNotFound(self.period_id))?;

        // 2. Cancelling an already-cancelled period is a silent no-op
        if !period.cancel()? {
            return Ok(vec![]);
        }
        ctx.storage.store_period(ctx.txn, &period)?;

        // 3. Emit event
        Ok(vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::PeriodCancelled,
            EventPayload::PeriodCancelled {
                period_id: self.period_id,
                user_id: period.user_id,
                year: period.end_year,
            },
        )])
    }
}
