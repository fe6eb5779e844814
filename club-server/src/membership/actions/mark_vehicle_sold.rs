//! MarkVehicleSold command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Record a sale; the vehicle keeps club access through a grace window
#[derive(Debug, Clone)]
pub struct MarkVehicleSoldAction {
    pub vehicle_id: u64,
    pub user_id: u64,
    pub sold_at: NaiveDate,
}

#[async_trait]
impl CommandHandler for MarkVehicleSoldAction {
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

        // 2. Enter the grace window; fails if already sold
        let grace_period_end = vehicle.mark_sold(self.sold_at)?;
        ctx.storage.store_vehicle(ctx.txn, &vehicle)?;

        // 3. Emit event
        Ok(vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::VehicleSold,
            EventPayload::VehicleSold {
                vehicle_id: self.vehicle_id,
                user_id: self.user_id,
                sold_at: self.sold_at,
                grace_period_end,
            },
        )])
    }
}
