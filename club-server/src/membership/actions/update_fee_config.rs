//! UpdateFeeConfig command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Revise a published fee calendar, e.g. after the board moves a deadline
#[derive(Debug, Clone)]
pub struct UpdateFeeConfigAction {
    pub target_year: i32,
    pub carry_over_deadline: NaiveDate,
    pub renewal_start_date: NaiveDate,
    pub renewal_deadline: NaiveDate,
    pub enrollment_fee: Decimal,
    pub annual_fee: Decimal,
    pub notes: Option<String>,
}

#[async_trait]
impl CommandHandler for UpdateFeeConfigAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Only an existing config can be revised
        let mut config = ctx
            .storage
            .get_fee_config_txn(ctx.txn, self.target_year)?
            .ok_or(DomainError::FeeConfigNotFound(self.target_year))?;

        // 2. Apply the revision; date ordering is re-validated
        config.update(
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
            MembershipEventType::FeeConfigUpdated,
            EventPayload::FeeConfigUpdated {
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
    use shared::membership::AnnualFeeConfig;

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "test-cmd-1".to_string(),
            operator_id: Some(7),
            operator_name: Some("Admin Lee".to_string()),
            timestamp: 0,
        }
    }

    fn seed_config(storage: &MembershipStorage, year: i32) {
        let txn = storage.begin_write().unwrap();
        let config = AnnualFeeConfig::new(
            year,
            NaiveDate::from_ymd_opt(year, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(year, 1, 31).unwrap(),
            Decimal::new(200_000, 0),
            Decimal::new(200_000, 0),
            Some(7),
            None,
        )
        .unwrap();
        storage.store_fee_config(&txn, &config).unwrap();
        txn.commit().unwrap();
    }

    async fn update(
        storage: &MembershipStorage,
        action: UpdateFeeConfigAction,
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
    async fn test_update_extends_deadline() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        seed_config(&storage, 2026);

        let events = update(
            &storage,
            UpdateFeeConfigAction {
                target_year: 2026,
                carry_over_deadline: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                renewal_start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                renewal_deadline: NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
                enrollment_fee: Decimal::new(200_000, 0),
                annual_fee: Decimal::new(220_000, 0),
                notes: Some("Deadline extended".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, MembershipEventType::FeeConfigUpdated);

        let config = storage.get_fee_config(2026).unwrap().unwrap();
        assert_eq!(
            config.renewal_deadline,
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
        assert_eq!(config.annual_fee, Decimal::new(220_000, 0));
    }

    #[tokio::test]
    async fn test_update_missing_year_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();

        let result = update(
            &storage,
            UpdateFeeConfigAction {
                target_year: 2030,
                carry_over_deadline: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
                renewal_start_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                renewal_deadline: NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
                enrollment_fee: Decimal::new(200_000, 0),
                annual_fee: Decimal::new(200_000, 0),
                notes: None,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::FeeConfigNotFound(2030)))
        ));
    }
}
