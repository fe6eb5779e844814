//! ConfirmPayment command handler
//!
//! Handles both the manual and the automatic confirmation commands; the
//! at-most-one-confirmed rule per application and per member-year is enforced
//! here against the storage slots.

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    DomainError, EventPayload, FeeType, MembershipEvent, MembershipEventType,
};

/// How the deposit was matched to the ledger record
#[derive(Debug, Clone)]
pub enum ConfirmationMethod {
    /// An admin checked the bank statement by hand
    Manual,
    /// The bank feed matched the deposit; no admin involved
    Automatic {
        bank_tx_id: String,
        bank_account: String,
    },
}

/// Confirm a pending deposit and claim its uniqueness slot
#[derive(Debug, Clone)]
pub struct ConfirmPaymentAction {
    pub payment_id: u64,
    pub method: ConfirmationMethod,
}

#[async_trait]
impl CommandHandler for ConfirmPaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Load the pending record
        let mut payment = ctx
            .storage
            .get_payment_txn(ctx.txn, self.payment_id)?
            .ok_or(DomainError::PaymentNotFound(self.payment_id))?;

        // 2. The uniqueness slot must be free before any mutation
        match payment.fee_type {
            FeeType::Enrollment => {
                let application_id = payment.application_id.ok_or_else(|| {
                    DomainError::InvalidInput(
                        "enrollment payment has no application reference".to_string(),
                    )
                })?;
                if ctx
                    .storage
                    .get_confirmed_enrollment_txn(ctx.txn, application_id)?
                    .is_some()
                {
                    return Err(DomainError::DuplicateEnrollmentPayment { application_id }.into());
                }
            }
            FeeType::Annual => {
                if let Some(year) = payment.target_year {
                    if ctx
                        .storage
                        .get_confirmed_annual_txn(ctx.txn, payment.user_id, year)?
                        .is_some()
                    {
                        return Err(DomainError::DuplicateAnnualPayment {
                            user_id: payment.user_id,
                            target_year: year,
                        }
                        .into());
                    }
                }
            }
        }

        // 3. Confirm the record
        match &self.method {
            ConfirmationMethod::Manual => {
                let admin_id = metadata.operator_id.ok_or_else(|| {
                    DomainError::InvalidInput(
                        "manual confirmation requires an operator".to_string(),
                    )
                })?;
                payment.confirm_manual(admin_id)?;
            }
            ConfirmationMethod::Automatic {
                bank_tx_id,
                bank_account,
            } => {
                payment.confirm_automatic(bank_tx_id.clone(), bank_account.clone())?;
            }
        }

        // 4. Claim the slot
        match payment.fee_type {
            FeeType::Enrollment => {
                if let Some(application_id) = payment.application_id {
                    ctx.storage
                        .set_confirmed_enrollment(ctx.txn, application_id, payment.id)?;

                    // 5. The settled application advances to PaymentConfirmed
                    //    in the same transaction
                    let mut application = ctx
                        .storage
                        .get_application_txn(ctx.txn, application_id)?
                        .ok_or(DomainError::ApplicationNotFound(application_id))?;
                    application.confirm_payment()?;
                    ctx.storage.store_application(ctx.txn, &application)?;
                }
            }
            FeeType::Annual => {
                if let Some(year) = payment.target_year {
                    ctx.storage
                        .set_confirmed_annual(ctx.txn, payment.user_id, year, payment.id)?;
                }
            }
        }
        ctx.storage.store_payment(ctx.txn, &payment)?;

        // 6. Emit the event that drives the lifecycle orchestrator
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::PaymentConfirmed,
            EventPayload::PaymentConfirmed {
                payment_id: payment.id,
                user_id: payment.user_id,
                fee_type: payment.fee_type,
                application_id: payment.application_id,
                target_year: payment.target_year,
                amount: payment.amount,
                deposit_date: payment.deposit_date,
                confirmed_by: payment.confirmed_by,
            },
        );
        Ok(vec![event])
    }
}
