//! RenewMembership command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    DomainError, EventPayload, FeeType, MembershipEvent, MembershipEventType, MembershipPeriod,
};

/// Open the next membership period from a confirmed annual payment
///
/// The payment's target year decides the covered year; renewal does not
/// demand an unbroken chain, a lapsed member may pay for a later year.
#[derive(Debug, Clone)]
pub struct RenewMembershipAction {
    pub user_id: u64,
    pub payment_id: u64,
}

#[async_trait]
impl CommandHandler for RenewMembershipAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. The backing payment must be a confirmed annual fee of this user
        let payment = ctx
            .storage
            .get_payment_txn(ctx.txn, self.payment_id)?
            .ok_or(DomainError::PaymentNotFound(self.payment_id))?;
        if payment.fee_type != FeeType::Annual {
            return Err(DomainError::WrongFeeType {
                expected: FeeType::Annual,
                actual: payment.fee_type,
            }
            .into());
        }
        if !payment.is_confirmed() {
            return Err(DomainError::InvalidPaymentStatus {
                status: payment.status,
                action: "renew from",
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

        // 2. An annual payment without a target year cannot buy a period
        let year = payment.target_year.ok_or(DomainError::MissingTargetYear)?;

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

        // 4. Create and index the renewed period
        let id = ctx.storage.next_entity_id(ctx.txn)?;
        let period = MembershipPeriod::new(id, self.user_id, year, self.payment_id, true);
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
                is_renewed: true,
            },
        );
        Ok(vec![event])
    }
}
