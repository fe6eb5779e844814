//! SetPrimaryVehicle command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    DomainError, EventPayload, MembershipEvent, MembershipEventType, VehicleStatus,
};

/// Make one of the member's vehicles the primary, demoting the current one
#[derive(Debug, Clone)]
pub struct SetPrimaryVehicleAction {
    pub vehicle_id: u64,
    pub user_id: u64,
}

#[async_trait]
impl CommandHandler for SetPrimaryVehicleAction {
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

        // 2. A sold or grace-period vehicle cannot be the primary
        if vehicle.status != VehicleStatus::Active {
            return Err(DomainError::InvalidVehicleState {
                status: vehicle.status,
                action: "set primary",
            }
            .into());
        }

        // 3. Re-asserting the current primary is a silent no-op
        if vehicle.is_primary {
            return Ok(vec![]);
        }

        // 4. Demote the current primary and promote this one
        let mut previous_primary_id = None;
        if let Some(mut current) = ctx
            .storage
            .get_primary_vehicle_txn(ctx.txn, self.user_id)?
        {
            current.set_primary(false);
            ctx.storage.store_vehicle(ctx.txn, &current)?;
            previous_primary_id = Some(current.id);
        }
        vehicle.set_primary(true);
        ctx.storage.store_vehicle(ctx.txn, &vehicle)?;

        // 5. Emit event
        Ok(vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::VehiclePrimaryChanged,
            EventPayload::VehiclePrimaryChanged {
                vehicle_id: self.vehicle_id,
                user_id: self.user_id,
                previous_primary_id,
            },
        )])
    }
}
