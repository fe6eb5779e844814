//! ExpirePeriod command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Close out a membership period that was not renewed in time
#[derive(Debug, Clone)]
pub struct ExpirePeriodAction {
    pub period_id: u64,
}

#[async_trait]
impl CommandHandler for ExpirePeriodAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Load the period
        let mut period = ctx
            .storage
            .get_period_txn(ctx.txn, self.period_id)?
            .ok_or(DomainError::PeriodNotFound(self.period_id))?;

        // 2. Expiring an already-expired period is a silent no-op
        if !period.expire()? {
            return Ok(vec![]);
        }
        ctx.storage.store_period(ctx.txn, &period)?;

        // 3. Emit event
        Ok(vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::PeriodExpired,
            EventPayload::PeriodExpired {
                period_id: self.period_id,
                user_id: period.user_id,
                year: period.end_year,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::calendar::FeeCalendar;
    use crate::membership::manager::ManagerError;
    use crate::membership::storage::MembershipStorage;
    use rust_decimal::Decimal;
    use shared::membership::{MembershipPeriod, PeriodStatus};

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "test-cmd-1".to_string(),
            operator_id: Some(7),
            operator_name: Some("Admin Lee".to_string()),
            timestamp: 0,
        }
    }

    fn seed_period(storage: &MembershipStorage, user_id: u64, year: i32) -> u64 {
        let txn = storage.begin_write().unwrap();
        let period_id = storage.next_entity_id(&txn).unwrap();
        let period = MembershipPeriod::new(period_id, user_id, year, 1, false);
        storage.store_period(&txn, &period).unwrap();
        storage.set_period_year(&txn, user_id, year, period_id).unwrap();
        txn.commit().unwrap();
        period_id
    }

    async fn expire(
        storage: &MembershipStorage,
        period_id: u64,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage, &calendar, chrono_tz::Asia::Seoul, 0);
        let action = ExpirePeriodAction { period_id };
        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        if result.is_ok() {
            txn.commit().unwrap();
        }
        result
    }

    #[tokio::test]
    async fn test_expire_active_period() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let period_id = seed_period(&storage, 100, 2025);

        let events = expire(&storage, period_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, MembershipEventType::PeriodExpired);

        let period = storage.get_period(period_id).unwrap().unwrap();
        assert_eq!(period.status, PeriodStatus::Expired);
    }

    #[tokio::test]
    async fn test_expire_twice_is_silent() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let period_id = seed_period(&storage, 100, 2025);

        expire(&storage, period_id).await.unwrap();
        let events = expire(&storage, period_id).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_expire_cancelled_period_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let period_id = seed_period(&storage, 100, 2025);

        let txn = storage.begin_write().unwrap();
        let mut period = storage.get_period_txn(&txn, period_id).unwrap().unwrap();
        period.cancel().unwrap();
        storage.store_period(&txn, &period).unwrap();
        txn.commit().unwrap();

        let result = expire(&storage, period_id).await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::InvalidPeriodState { .. }))
        ));
    }

    #[tokio::test]
    async fn test_expire_missing_period_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let result = expire(&storage, 42).await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::PeriodNotFound(42)))
        ));
    }
}
