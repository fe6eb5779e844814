//! CancelPayment command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    DomainError, EventPayload, FeeType, MembershipEvent, MembershipEventType, PaymentStatus,
};

/// Withdraw a ledger record; cancelling a confirmed one frees its slot
#[derive(Debug, Clone)]
pub struct CancelPaymentAction {
    pub payment_id: u64,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for CancelPaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Cancellation is an admin act
        let admin_id = metadata.operator_id.ok_or_else(|| {
            DomainError::InvalidInput("payment cancellation requires an operator".to_string())
        })?;

        // 2. Load and cancel; an already-cancelled record is a silent no-op
        let mut payment = ctx
            .storage
            .get_payment_txn(ctx.txn, self.payment_id)?
            .ok_or(DomainError::PaymentNotFound(self.payment_id))?;
        let was_confirmed = payment.status == PaymentStatus::Confirmed;
        if !payment.cancel(self.reason.clone(), admin_id)? {
            return Ok(vec![]);
        }

        // 3. A withdrawn confirmation frees the uniqueness slot
        if was_confirmed {
            match payment.fee_type {
                FeeType::Enrollment => {
                    if let Some(application_id) = payment.application_id {
                        ctx.storage.clear_confirmed_enrollment(ctx.txn, application_id)?;
                    }
                }
                FeeType::Annual => {
                    if let Some(year) = payment.target_year {
                        ctx.storage
                            .clear_confirmed_annual(ctx.txn, payment.user_id, year)?;
                    }
                }
            }
        }
        ctx.storage.store_payment(ctx.txn, &payment)?;

        // 4. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::PaymentCancelled,
            EventPayload::PaymentCancelled {
                payment_id: payment.id,
                user_id: payment.user_id,
                reason: self.reason.clone(),
                was_confirmed,
            },
        );
        Ok(vec![event])
    }
}
