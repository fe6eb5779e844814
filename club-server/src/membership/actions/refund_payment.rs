//! RefundPayment command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::membership::{
    DomainError, EventPayload, FeeType, MembershipEvent, MembershipEventType,
};

/// Return money for a confirmed deposit and free its slot
#[derive(Debug, Clone)]
pub struct RefundPaymentAction {
    pub payment_id: u64,
    pub refund_amount: Decimal,
}

#[async_trait]
impl CommandHandler for RefundPaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Refunds are an admin act
        let admin_id = metadata.operator_id.ok_or_else(|| {
            DomainError::InvalidInput("refund requires an operator".to_string())
        })?;

        // 2. Only a confirmed record can be refunded, at most in full
        let mut payment = ctx
            .storage
            .get_payment_txn(ctx.txn, self.payment_id)?
            .ok_or(DomainError::PaymentNotFound(self.payment_id))?;
        payment.refund(self.refund_amount, admin_id)?;

        // 3. The refunded fee no longer settles anything
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
        ctx.storage.store_payment(ctx.txn, &payment)?;

        // 4. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::PaymentRefunded,
            EventPayload::PaymentRefunded {
                payment_id: payment.id,
                user_id: payment.user_id,
                refund_amount: self.refund_amount,
            },
        );
        Ok(vec![event])
    }
}
