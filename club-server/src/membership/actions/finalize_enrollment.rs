//! FinalizeEnrollment command handler
//!
//! The orchestrator derives this command from an enrollment PaymentConfirmed
//! event. One transaction completes the application, hands out the member
//! number, opens the first membership period and puts the declared vehicle on
//! the roster.

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    DomainError, EventPayload, MemberVehicle, MembershipEvent, MembershipEventType,
    MembershipPeriod,
};

/// Turn a paid-up application into a full membership
#[derive(Debug, Clone)]
pub struct FinalizeEnrollmentAction {
    pub application_id: u64,
}

#[async_trait]
impl CommandHandler for FinalizeEnrollmentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Load the application and its confirmed enrollment payment
        let mut application = ctx
            .storage
            .get_application_txn(ctx.txn, self.application_id)?
            .ok_or(DomainError::ApplicationNotFound(self.application_id))?;
        let payment_id = ctx
            .storage
            .get_confirmed_enrollment_txn(ctx.txn, self.application_id)?
            .ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "application {} has no confirmed enrollment payment",
                    self.application_id
                ))
            })?;
        let payment = ctx
            .storage
            .get_payment_txn(ctx.txn, payment_id)?
            .ok_or(DomainError::PaymentNotFound(payment_id))?;

        // 2. Member numbers are permanent: a returning member keeps the old one
        let user_id = application.user_id;
        let member_number = match ctx.storage.get_member_number_txn(ctx.txn, user_id)? {
            Some(number) => number,
            None => {
                let number = ctx.storage.next_member_number(ctx.txn)?;
                ctx.storage.set_member_number(ctx.txn, user_id, number)?;
                number
            }
        };

        // 3. PaymentConfirmed -> Completed (a second finalize fails here)
        application.complete(member_number)?;
        ctx.storage.store_application(ctx.txn, &application)?;

        // 4. The user may apply again one day; release the live slots
        ctx.storage.clear_active_application(ctx.txn, user_id)?;
        ctx.storage
            .release_application_vin(ctx.txn, &application.vehicle.vin)?;

        // 5. Open the first membership period
        let year = application
            .payment_target_year
            .or(payment.target_year)
            .unwrap_or_else(|| ctx.current_year());
        if ctx
            .storage
            .get_period_for_year_txn(ctx.txn, user_id, year)?
            .is_some()
        {
            return Err(DomainError::PeriodAlreadyExists { user_id, year }.into());
        }
        let period_id = ctx.storage.next_entity_id(ctx.txn)?;
        let period = MembershipPeriod::new(period_id, user_id, year, payment_id, false);
        ctx.storage.store_period(ctx.txn, &period)?;
        ctx.storage.set_period_year(ctx.txn, user_id, year, period_id)?;

        let mut events = vec![
            metadata.event(
                ctx.next_sequence(),
                MembershipEventType::ApplicationCompleted,
                EventPayload::ApplicationCompleted {
                    application_id: self.application_id,
                    user_id,
                    member_number,
                    target_year: year,
                },
            ),
            metadata.event(
                ctx.next_sequence(),
                MembershipEventType::PeriodCreated,
                EventPayload::PeriodCreated {
                    period_id,
                    user_id,
                    year,
                    payment_id,
                    is_renewed: false,
                },
            ),
        ];

        // 6. Move the declared vehicle onto the roster, unless its VIN is
        //    already there (a returning member re-enrolling the same car)
        if ctx
            .storage
            .find_vehicle_by_vin_txn(ctx.txn, &application.vehicle.vin)?
            .is_none()
        {
            let is_primary = ctx
                .storage
                .get_primary_vehicle_txn(ctx.txn, user_id)?
                .is_none();
            let vehicle_id = ctx.storage.next_entity_id(ctx.txn)?;
            let vehicle = MemberVehicle::new(
                vehicle_id,
                user_id,
                application.vehicle.plate_number.clone(),
                application.vehicle.vin.clone(),
                application.vehicle.model_name.clone(),
                application.category,
                is_primary,
            );
            ctx.storage.store_vehicle(ctx.txn, &vehicle)?;
            ctx.storage
                .reserve_vehicle_vin(ctx.txn, &vehicle.vin, vehicle_id)?;
            events.push(metadata.event(
                ctx.next_sequence(),
                MembershipEventType::VehicleRegistered,
                EventPayload::VehicleRegistered {
                    vehicle_id,
                    user_id,
                    vin: vehicle.vin.clone(),
                    is_primary,
                },
            ));
        } else {
            tracing::debug!(
                application_id = self.application_id,
                vin = %application.vehicle.vin,
                "VIN already on the roster, skipping vehicle registration"
            );
        }

        Ok(events)
    }
}
