//! SubmitApplication command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    ApplicantSnapshot, DomainError, EventPayload, MembershipApplication, MembershipEvent,
    MembershipEventType, OwnershipCategory, VehicleSnapshot,
};

/// Open a membership application for a user
#[derive(Debug, Clone)]
pub struct SubmitApplicationAction {
    pub user_id: u64,
    pub category: OwnershipCategory,
    pub applicant: ApplicantSnapshot,
    pub vehicle: VehicleSnapshot,
}

#[async_trait]
impl CommandHandler for SubmitApplicationAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. One live application per user
        if ctx
            .storage
            .get_active_application_id_txn(ctx.txn, self.user_id)?
            .is_some()
        {
            return Err(DomainError::DuplicateActiveApplication {
                user_id: self.user_id,
            }
            .into());
        }

        // 2. The declared VIN must not be claimed by another live application
        if ctx
            .storage
            .find_application_by_vin_txn(ctx.txn, &self.vehicle.vin)?
            .is_some()
        {
            return Err(DomainError::DuplicateVin {
                vin: self.vehicle.vin.clone(),
            }
            .into());
        }

        // 3. Allocate the id and the day-scoped application number
        let id = ctx.storage.next_entity_id(ctx.txn)?;
        let day_key = ctx.today().format("%Y%m%d").to_string();
        let day_seq = ctx.storage.next_application_day_seq(ctx.txn, &day_key)?;
        let application_number = format!("APP-{day_key}-{day_seq:05}");

        // 4. Create the aggregate in DocumentPending
        let application = MembershipApplication::new(
            id,
            self.user_id,
            application_number.clone(),
            self.category,
            self.applicant.clone(),
            self.vehicle.clone(),
        );
        ctx.storage.store_application(ctx.txn, &application)?;

        // 5. Claim the per-user and VIN slots
        ctx.storage.set_active_application(ctx.txn, self.user_id, id)?;
        ctx.storage
            .reserve_application_vin(ctx.txn, &self.vehicle.vin, id)?;

        // 6. Emit the submission event
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::ApplicationSubmitted,
            EventPayload::ApplicationSubmitted {
                application_id: id,
                user_id: self.user_id,
                application_number,
                category: self.category,
                vin: self.vehicle.vin.clone(),
            },
        );
        Ok(vec![event])
    }
}
