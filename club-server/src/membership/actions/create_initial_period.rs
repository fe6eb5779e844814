//! CreateInitialPeriod command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    DomainError, EventPayload, FeeType, MembershipEvent, MembershipEventType, MembershipPeriod,
};

/// Open the first membership period from a confirmed enrollment payment
///
/// Normally FinalizeEnrollment does this as part of completing the
/// application; the standalone command exists for backfilling memberships
/// that predate the engine.
#[derive(Debug, Clone)]
pub struct CreateInitialPeriodAction {
    pub user_id: u64,
    pub payment_id: u64,
    pub target_year: Option<i32>,
}

#[async_trait]
impl CommandHandler for CreateInitialPeriodAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. The backing payment must be a confirmed enrollment fee of this user
        let payment = ctx
            .storage
            .get_payment_txn(ctx.txn, self.payment_id)?
            .ok_or(DomainError::PaymentNotFound(self.payment_id))?;
        if payment.fee_type != FeeType::Enrollment {
            return Err(DomainError::WrongFeeType {
                expected: FeeType::Enrollment,
                actual: payment.fee_type,
            }
            .into());
        }
        if !payment.is_confirmed() {
            return Err(DomainError::InvalidPaymentStatus {
                status: payment.status,
                action: "create a period from",
            }
            .into());
        }
        if payment.user_id != self.user_id {
            return Err(DomainError::InvalidInput(format!(
                "payment {} does not belong to user {}",
                self.payment_id, self.user_id
            ))
            .into());
        }

        // 2. Resolve the covered year
        let year = self
            .target_year
            .or(payment.target_year)
            .unwrap_or_else(|| ctx.current_year());

        // 3. One period per member-year
        if ctx
            .storage
            .get_period_for_year_txn(ctx.txn, self.user_id, year)?
            .is_some()
        {
            return Err(DomainError::PeriodAlreadyExists {
                user_id: self.user_id,
                year,
            }
            .into());
        }

        // 4. Create and index
        let id = ctx.storage.next_entity_id(ctx.txn)?;
        let period = MembershipPeriod::new(id, self.user_id, year, self.payment_id, false);
        ctx.storage.store_period(ctx.txn, &period)?;
        ctx.storage.set_period_year(ctx.txn, self.user_id, year, id)?;

        // 5. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::PeriodCreated,
            EventPayload::PeriodCreated {
                period_id: id,
                user_id: self.user_id,
                year,
                payment_id: self.payment_id,
                is_renewed: false,
            },
        );
        Ok(vec![event])
    }
}
