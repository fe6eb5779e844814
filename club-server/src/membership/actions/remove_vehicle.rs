//! RemoveVehicle command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Take a vehicle off the roster and free its VIN
#[derive(Debug, Clone)]
pub struct RemoveVehicleAction {
    pub vehicle_id: u64,
    pub user_id: u64,
}

#[async_trait]
impl CommandHandler for RemoveVehicleAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Load the vehicle and check ownership
        let vehicle = ctx
            .storage
            .get_vehicle_txn(ctx.txn, self.vehicle_id)?
            .ok_or(DomainError::VehicleNotFound(self.vehicle_id))?;
        if vehicle.user_id != self.user_id {
            return Err(DomainError::NotVehicleOwner {
                vehicle_id: self.vehicle_id,
                user_id: self.user_id,
            }
            .into());
        }

        // 2. Drop the record and release the VIN for future registrations
        ctx.storage.remove_vehicle(ctx.txn, self.vehicle_id)?;
        ctx.storage.release_vehicle_vin(ctx.txn, &vehicle.vin)?;

        // 3. Emit event
        Ok(vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::VehicleRemoved,
            EventPayload::VehicleRemoved {
                vehicle_id: self.vehicle_id,
                user_id: self.user_id,
                vin: vehicle.vin.clone(),
            },
        )])
    }
}
