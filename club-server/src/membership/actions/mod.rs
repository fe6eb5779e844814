//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use async_trait::async_trait;

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use shared::membership::{CommandPayload, MembershipCommand, MembershipEvent};

mod approve_application;
mod cancel_application;
mod cancel_payment;
mod cancel_period;
mod confirm_payment;
mod create_fee_config;
mod create_initial_period;
mod expire_period;
mod finalize_enrollment;
mod mark_expiration_notified;
mod mark_payment_pending;
mod mark_vehicle_sold;
mod refund_payment;
mod register_payment;
mod register_vehicle;
mod reject_application;
mod reject_document;
mod remove_vehicle;
mod renew_membership;
mod reprocess_ocr;
mod set_primary_vehicle;
mod start_review;
mod submit_application;
mod update_fee_config;
mod update_vehicle;
mod upload_document;
mod verify_document;

pub use approve_application::ApproveApplicationAction;
pub use cancel_application::CancelApplicationAction;
pub use cancel_payment::CancelPaymentAction;
pub use cancel_period::CancelPeriodAction;
pub use confirm_payment::{ConfirmPaymentAction, ConfirmationMethod};
pub use create_fee_config::CreateFeeConfigAction;
pub use create_initial_period::CreateInitialPeriodAction;
pub use expire_period::ExpirePeriodAction;
pub use finalize_enrollment::FinalizeEnrollmentAction;
pub use mark_expiration_notified::MarkExpirationNotifiedAction;
pub use mark_payment_pending::MarkPaymentPendingAction;
pub use mark_vehicle_sold::MarkVehicleSoldAction;
pub use refund_payment::RefundPaymentAction;
pub use register_payment::RegisterPaymentAction;
pub use register_vehicle::RegisterVehicleAction;
pub use reject_application::RejectApplicationAction;
pub use reject_document::RejectDocumentAction;
pub use remove_vehicle::RemoveVehicleAction;
pub use renew_membership::RenewMembershipAction;
pub use reprocess_ocr::ReprocessOcrAction;
pub use set_primary_vehicle::SetPrimaryVehicleAction;
pub use start_review::StartReviewAction;
pub use submit_application::SubmitApplicationAction;
pub use update_fee_config::UpdateFeeConfigAction;
pub use update_vehicle::UpdateVehicleAction;
pub use upload_document::UploadDocumentAction;
pub use verify_document::VerifyDocumentAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    SubmitApplication(SubmitApplicationAction),
    UploadDocument(UploadDocumentAction),
    VerifyDocument(VerifyDocumentAction),
    RejectDocument(RejectDocumentAction),
    StartReview(StartReviewAction),
    ApproveApplication(ApproveApplicationAction),
    RejectApplication(RejectApplicationAction),
    CancelApplication(CancelApplicationAction),
    MarkPaymentPending(MarkPaymentPendingAction),
    RegisterPayment(RegisterPaymentAction),
    ConfirmPayment(ConfirmPaymentAction),
    CancelPayment(CancelPaymentAction),
    RefundPayment(RefundPaymentAction),
    CreateInitialPeriod(CreateInitialPeriodAction),
    RenewMembership(RenewMembershipAction),
    FinalizeEnrollment(FinalizeEnrollmentAction),
    ExpirePeriod(ExpirePeriodAction),
    CancelPeriod(CancelPeriodAction),
    MarkExpirationNotified(MarkExpirationNotifiedAction),
    CreateFeeConfig(CreateFeeConfigAction),
    UpdateFeeConfig(UpdateFeeConfigAction),
    RegisterVehicle(RegisterVehicleAction),
    UpdateVehicle(UpdateVehicleAction),
    SetPrimaryVehicle(SetPrimaryVehicleAction),
    RemoveVehicle(RemoveVehicleAction),
    MarkVehicleSold(MarkVehicleSoldAction),
    ReprocessOcr(ReprocessOcrAction),
}

/// Manual implementation of CommandHandler for CommandAction
#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        match self {
            CommandAction::SubmitApplication(action) => action.execute(ctx, metadata).await,
            CommandAction::UploadDocument(action) => action.execute(ctx, metadata).await,
            CommandAction::VerifyDocument(action) => action.execute(ctx, metadata).await,
            CommandAction::RejectDocument(action) => action.execute(ctx, metadata).await,
            CommandAction::StartReview(action) => action.execute(ctx, metadata).await,
            CommandAction::ApproveApplication(action) => action.execute(ctx, metadata).await,
            CommandAction::RejectApplication(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelApplication(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkPaymentPending(action) => action.execute(ctx, metadata).await,
            CommandAction::RegisterPayment(action) => action.execute(ctx, metadata).await,
            CommandAction::ConfirmPayment(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelPayment(action) => action.execute(ctx, metadata).await,
            CommandAction::RefundPayment(action) => action.execute(ctx, metadata).await,
            CommandAction::CreateInitialPeriod(action) => action.execute(ctx, metadata).await,
            CommandAction::RenewMembership(action) => action.execute(ctx, metadata).await,
            CommandAction::FinalizeEnrollment(action) => action.execute(ctx, metadata).await,
            CommandAction::ExpirePeriod(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelPeriod(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkExpirationNotified(action) => action.execute(ctx, metadata).await,
            CommandAction::CreateFeeConfig(action) => action.execute(ctx, metadata).await,
            CommandAction::UpdateFeeConfig(action) => action.execute(ctx, metadata).await,
            CommandAction::RegisterVehicle(action) => action.execute(ctx, metadata).await,
            CommandAction::UpdateVehicle(action) => action.execute(ctx, metadata).await,
            CommandAction::SetPrimaryVehicle(action) => action.execute(ctx, metadata).await,
            CommandAction::RemoveVehicle(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkVehicleSold(action) => action.execute(ctx, metadata).await,
            CommandAction::ReprocessOcr(action) => action.execute(ctx, metadata).await,
        }
    }
}

/// Convert MembershipCommand to CommandAction
///
/// This is the ONLY place with a match on CommandPayload.
impl From<&MembershipCommand> for CommandAction {
    fn from(cmd: &MembershipCommand) -> Self {
        match &cmd.payload {
            CommandPayload::SubmitApplication {
                user_id,
                category,
                applicant,
                vehicle,
            } => CommandAction::SubmitApplication(SubmitApplicationAction {
                user_id: *user_id,
                category: *category,
                applicant: applicant.clone(),
                vehicle: vehicle.clone(),
            }),
            CommandPayload::UploadDocument {
                application_id,
                document_type,
                file,
            } => CommandAction::UploadDocument(UploadDocumentAction {
                application_id: *application_id,
                document_type: *document_type,
                file: file.clone(),
            }),
            CommandPayload::VerifyDocument {
                application_id,
                document_type,
            } => CommandAction::VerifyDocument(VerifyDocumentAction {
                application_id: *application_id,
                document_type: *document_type,
            }),
            CommandPayload::RejectDocument {
                application_id,
                document_type,
                reason,
            } => CommandAction::RejectDocument(RejectDocumentAction {
                application_id: *application_id,
                document_type: *document_type,
                reason: reason.clone(),
            }),
            CommandPayload::StartReview { application_id } => {
                CommandAction::StartReview(StartReviewAction {
                    application_id: *application_id,
                })
            }
            CommandPayload::ApproveApplication { application_id } => {
                CommandAction::ApproveApplication(ApproveApplicationAction {
                    application_id: *application_id,
                })
            }
            CommandPayload::RejectApplication {
                application_id,
                reason,
            } => CommandAction::RejectApplication(RejectApplicationAction {
                application_id: *application_id,
                reason: reason.clone(),
            }),
            CommandPayload::CancelApplication {
                application_id,
                reason,
            } => CommandAction::CancelApplication(CancelApplicationAction {
                application_id: *application_id,
                reason: reason.clone(),
            }),
            CommandPayload::MarkPaymentPending {
                application_id,
                amount,
                target_year,
            } => CommandAction::MarkPaymentPending(MarkPaymentPendingAction {
                application_id: *application_id,
                amount: *amount,
                target_year: *target_year,
            }),
            CommandPayload::RegisterPayment {
                user_id,
                application_id,
                fee_type,
                target_year,
                amount,
                depositor_name,
                deposit_date,
            } => CommandAction::RegisterPayment(RegisterPaymentAction {
                user_id: *user_id,
                application_id: *application_id,
                fee_type: *fee_type,
                target_year: *target_year,
                amount: *amount,
                depositor_name: depositor_name.clone(),
                deposit_date: *deposit_date,
            }),
            CommandPayload::ConfirmPaymentManual { payment_id } => {
                CommandAction::ConfirmPayment(ConfirmPaymentAction {
                    payment_id: *payment_id,
                    method: ConfirmationMethod::Manual,
                })
            }
            CommandPayload::ConfirmPaymentAutomatic {
                payment_id,
                bank_tx_id,
                bank_account,
            } => CommandAction::ConfirmPayment(ConfirmPaymentAction {
                payment_id: *payment_id,
                method: ConfirmationMethod::Automatic {
                    bank_tx_id: bank_tx_id.clone(),
                    bank_account: bank_account.clone(),
                },
            }),
            CommandPayload::CancelPayment { payment_id, reason } => {
                CommandAction::CancelPayment(CancelPaymentAction {
                    payment_id: *payment_id,
                    reason: reason.clone(),
                })
            }
            CommandPayload::RefundPayment {
                payment_id,
                refund_amount,
            } => CommandAction::RefundPayment(RefundPaymentAction {
                payment_id: *payment_id,
                refund_amount: *refund_amount,
            }),
            CommandPayload::CreateInitialPeriod {
                user_id,
                payment_id,
                target_year,
            } => CommandAction::CreateInitialPeriod(CreateInitialPeriodAction {
                user_id: *user_id,
                payment_id: *payment_id,
                target_year: *target_year,
            }),
            CommandPayload::RenewMembership {
                user_id,
                payment_id,
            } => CommandAction::RenewMembership(RenewMembershipAction {
                user_id: *user_id,
                payment_id: *payment_id,
            }),
            CommandPayload::FinalizeEnrollment { application_id } => {
                CommandAction::FinalizeEnrollment(FinalizeEnrollmentAction {
                    application_id: *application_id,
                })
            }
            CommandPayload::ExpirePeriod { period_id } => {
                CommandAction::ExpirePeriod(ExpirePeriodAction {
                    period_id: *period_id,
                })
            }
            CommandPayload::CancelPeriod { period_id } => {
                CommandAction::CancelPeriod(CancelPeriodAction {
                    period_id: *period_id,
                })
            }
            CommandPayload::MarkExpirationNotified { period_id } => {
                CommandAction::MarkExpirationNotified(MarkExpirationNotifiedAction {
                    period_id: *period_id,
                })
            }
            CommandPayload::CreateFeeConfig {
                target_year,
                carry_over_deadline,
                renewal_start_date,
                renewal_deadline,
                enrollment_fee,
                annual_fee,
                notes,
            } => CommandAction::CreateFeeConfig(CreateFeeConfigAction {
                target_year: *target_year,
                carry_over_deadline: *carry_over_deadline,
                renewal_start_date: *renewal_start_date,
                renewal_deadline: *renewal_deadline,
                enrollment_fee: *enrollment_fee,
                annual_fee: *annual_fee,
                notes: notes.clone(),
            }),
            CommandPayload::UpdateFeeConfig {
                target_year,
                carry_over_deadline,
                renewal_start_date,
                renewal_deadline,
                enrollment_fee,
                annual_fee,
                notes,
            } => CommandAction::UpdateFeeConfig(UpdateFeeConfigAction {
                target_year: *target_year,
                carry_over_deadline: *carry_over_deadline,
                renewal_start_date: *renewal_start_date,
                renewal_deadline: *renewal_deadline,
                enrollment_fee: *enrollment_fee,
                annual_fee: *annual_fee,
                notes: notes.clone(),
            }),
            CommandPayload::RegisterVehicle {
                user_id,
                plate_number,
                vin,
                model_name,
                category,
                is_primary,
            } => CommandAction::RegisterVehicle(RegisterVehicleAction {
                user_id: *user_id,
                plate_number: plate_number.clone(),
                vin: vin.clone(),
                model_name: model_name.clone(),
                category: *category,
                is_primary: *is_primary,
            }),
            CommandPayload::UpdateVehicle {
                vehicle_id,
                user_id,
                plate_number,
                model_name,
            } => CommandAction::UpdateVehicle(UpdateVehicleAction {
                vehicle_id: *vehicle_id,
                user_id: *user_id,
                plate_number: plate_number.clone(),
                model_name: model_name.clone(),
            }),
            CommandPayload::SetPrimaryVehicle {
                vehicle_id,
                user_id,
            } => CommandAction::SetPrimaryVehicle(SetPrimaryVehicleAction {
                vehicle_id: *vehicle_id,
                user_id: *user_id,
            }),
            CommandPayload::RemoveVehicle {
                vehicle_id,
                user_id,
            } => CommandAction::RemoveVehicle(RemoveVehicleAction {
                vehicle_id: *vehicle_id,
                user_id: *user_id,
            }),
            CommandPayload::MarkVehicleSold {
                vehicle_id,
                user_id,
                sold_at,
            } => CommandAction::MarkVehicleSold(MarkVehicleSoldAction {
                vehicle_id: *vehicle_id,
                user_id: *user_id,
                sold_at: *sold_at,
            }),
            CommandPayload::ReprocessOcr {
                application_id,
                document_type,
            } => CommandAction::ReprocessOcr(ReprocessOcrAction {
                application_id: *application_id,
                document_type: *document_type,
            }),
        }
    }
}
