//! RegisterVehicle command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{
    DomainError, EventPayload, MemberVehicle, MembershipEvent, MembershipEventType,
    OwnershipCategory,
};

/// Add a vehicle to a member's roster
#[derive(Debug, Clone)]
pub struct RegisterVehicleAction {
    pub user_id: u64,
    pub plate_number: String,
    pub vin: String,
    pub model_name: String,
    pub category: OwnershipCategory,
    pub is_primary: bool,
}

#[async_trait]
impl CommandHandler for RegisterVehicleAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. A VIN identifies one vehicle across the whole roster
        if ctx
            .storage
            .find_vehicle_by_vin_txn(ctx.txn, &self.vin)?
            .is_some()
        {
            return Err(DomainError::DuplicateVehicleVin {
                vin: self.vin.clone(),
            }
            .into());
        }

        // 2. Claiming primary demotes the current primary, if any
        let mut previous_primary_id = None;
        if self.is_primary {
            if let Some(mut current) = ctx
                .storage
                .get_primary_vehicle_txn(ctx.txn, self.user_id)?
            {
                current.set_primary(false);
                ctx.storage.store_vehicle(ctx.txn, &current)?;
                previous_primary_id = Some(current.id);
            }
        }

        // 3. Store the vehicle and claim its VIN
        let vehicle_id = ctx.storage.next_entity_id(ctx.txn)?;
        let vehicle = MemberVehicle::new(
            vehicle_id,
            self.user_id,
            self.plate_number.clone(),
            self.vin.clone(),
            self.model_name.clone(),
            self.category,
            self.is_primary,
        );
        ctx.storage.store_vehicle(ctx.txn, &vehicle)?;
        ctx.storage
            .reserve_vehicle_vin(ctx.txn, &self.vin, vehicle_id)?;

        // 4. Emit events
        let mut events = vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::VehicleRegistered,
            EventPayload::VehicleRegistered {
                vehicle_id,
                user_id: self.user_id,
                vin: self.vin.clone(),
                is_primary: self.is_primary,
            },
        )];
        if previous_primary_id.is_some() {
            events.push(metadata.event(
                ctx.next_sequence(),
                MembershipEventType::VehiclePrimaryChanged,
                EventPayload::VehiclePrimaryChanged {
                    vehicle_id,
                    user_id: self.user_id,
                    previous_primary_id,
                },
            ));
        }
        Ok(events)
    }
}
