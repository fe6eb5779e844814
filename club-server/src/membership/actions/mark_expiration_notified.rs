//! MarkExpirationNotified command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Record that the member was told their period is about to lapse, so the
/// reminder job does not nag them twice
#[derive(Debug, Clone)]
pub struct MarkExpirationNotifiedAction {
    pub period_id: u64,
}

#[async_trait]
impl CommandHandler for MarkExpirationNotifiedAction {
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

        // 2. A repeated notification is a silent no-op
        if !period.mark_expiration_notified() {
            return Ok(vec![]);
        }
        ctx.storage.store_period(ctx.txn, &period)?;

        // 3. Emit event
        Ok(vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::ExpirationNotified,
            EventPayload::ExpirationNotified {
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
    use crate::membership::storage::MembershipStorage;
    use rust_decimal::Decimal;
    use shared::membership::MembershipPeriod;

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "test-cmd-1".to_string(),
            operator_id: None,
            operator_name: None,
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

    async fn notify(
        storage: &MembershipStorage,
        period_id: u64,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage, &calendar, chrono_tz::Asia::Seoul, 0);
        let action = MarkExpirationNotifiedAction { period_id };
        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        if result.is_ok() {
            txn.commit().unwrap();
        }
        result
    }

    #[tokio::test]
    async fn test_first_notification_is_recorded() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let period_id = seed_period(&storage, 100, 2025);

        let events = notify(&storage, period_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, MembershipEventType::ExpirationNotified);

        let period = storage.get_period(period_id).unwrap().unwrap();
        assert!(period.expiration_notified_at.is_some());
    }

    #[tokio::test]
    async fn test_second_notification_is_silent() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let period_id = seed_period(&storage, 100, 2025);

        notify(&storage, period_id).await.unwrap();
        let events = notify(&storage, period_id).await.unwrap();
        assert!(events.is_empty());
    }
}
