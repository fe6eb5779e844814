//! UpdateVehicle command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Correct a vehicle's plate number or model name
#[derive(Debug, Clone)]
pub struct UpdateVehicleAction {
    pub vehicle_id: u64,
    pub user_id: u64,
    pub plate_number: Option<String>,
    pub model_name: Option<String>,
}

#[async_trait]
impl CommandHandler for UpdateVehicleAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Load the vehicle and check ownership
        let mut vehicle = ctx
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

        // 2. Apply the edits
        vehicle.update_details(self.plate_number.clone(), self.model_name.clone());
        ctx.storage.store_vehicle(ctx.txn, &vehicle)?;

        // 3. Emit event
        Ok(vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::VehicleUpdated,
            EventPayload::VehicleUpdated {
                vehicle_id: self.vehicle_id,
                user_id: self.user_id,
            },
        )])
    }
}
