//! CreateFeeConfig command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::membership::{
    AnnualFeeConfig, DomainError, EventPayload, MembershipEvent, MembershipEventType,
};

/// Publish the fee calendar for a target year
#[derive(Debug, Clone)]
pub struct CreateFeeConfigAction {
    pub target_year: i32,
    pub carry_over_deadline: NaiveDate,
    pub renewal_start_date: NaiveDate,
    pub renewal_deadline: NaiveDate,
    pub enrollment_fee: Decimal,
    pub annual_fee: Decimal,
    pub notes: Option<String>,
}

#[async_trait]
impl CommandHandler for CreateFeeConfigAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. One config per target year
        if ctx
            .storage
            .get_fee_config_txn(ctx.txn, self.target_year)?
            .is_some()
        {
            return Err(DomainError::DuplicateFeeConfig(self.target_year).into());
        }

        // 2. Build the config; the aggregate validates date ordering
        let config = AnnualFeeConfig::new(
            self.target_year,
            self.carry_over_deadline,
            self.renewal_start_date,
            self.renewal_deadline,
            self.enrollment_fee,
            self.annual_fee,
            metadata.operator_id,
            self.notes.clone(),
        )?;
        ctx.storage.store_fee_config(ctx.txn, &config)?;

        // 3. Emit event
        Ok(vec![metadata.event(
            ctx.next_sequence(),
            MembershipEventType::FeeConfigCreated,
            EventPayload::FeeConfigCreated {
                target_year: self.target_year,
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

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "test-cmd-1".to_string(),
            operator_id: Some(7),
            operator_name: Some("Admin Lee".to_string()),
            timestamp: 0,
        }
    }

    fn action_for(year: i32) -> CreateFeeConfigAction {
        CreateFeeConfigAction {
            target_year: year,
            carry_over_deadline: NaiveDate::from_ymd_opt(year, 1, 20).unwrap(),
            renewal_start_date: NaiveDate::from_ymd_opt(year, 1, 2).unwrap(),
            renewal_deadline: NaiveDate::from_ymd_opt(year, 2, 15).unwrap(),
            enrollment_fee: Decimal::new(250_000, 0),
            annual_fee: Decimal::new(180_000, 0),
            notes: Some("Board approved in December".to_string()),
        }
    }

    async fn create(
        storage: &MembershipStorage,
        action: CreateFeeConfigAction,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage, &calendar, chrono_tz::Asia::Seoul, 0);
        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        if result.is_ok() {
            txn.commit().unwrap();
        }
        result
    }

    #[tokio::test]
    async fn test_create_fee_config() {
        let storage = MembershipStorage::open_in_memory().unwrap();

        let events = create(&storage, action_for(2026)).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, MembershipEventType::FeeConfigCreated);

        let config = storage.get_fee_config(2026).unwrap().unwrap();
        assert_eq!(config.annual_fee, Decimal::new(180_000, 0));
        assert_eq!(config.configured_by, Some(7));
    }

    #[tokio::test]
    async fn test_duplicate_year_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();

        create(&storage, action_for(2026)).await.unwrap();
        let result = create(&storage, action_for(2026)).await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::DuplicateFeeConfig(2026)))
        ));
    }

    #[tokio::test]
    async fn test_inverted_dates_fail() {
        let storage = MembershipStorage::open_in_memory().unwrap();

        let mut action = action_for(2026);
        action.carry_over_deadline = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let result = create(&storage, action).await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::InvalidFeePeriod))
        ));
    }
}
