//! MarkPaymentPending command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::membership::{DomainError, EventPayload, MembershipEvent, MembershipEventType};

/// Issue the enrollment fee notice for an approved application
///
/// Amount and target year fall back to the fee calendar of the current year
/// when the command leaves them out.
#[derive(Debug, Clone)]
pub struct MarkPaymentPendingAction {
    pub application_id: u64,
    pub amount: Option<Decimal>,
    pub target_year: Option<i32>,
}

#[async_trait]
impl CommandHandler for MarkPaymentPendingAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Load the approved application
        let mut application = ctx
            .storage
            .get_application_txn(ctx.txn, self.application_id)?
            .ok_or(DomainError::ApplicationNotFound(self.application_id))?;

        // 2. Resolve the year and the fee amount
        let target_year = self.target_year.unwrap_or_else(|| ctx.current_year());
        let amount = match self.amount {
            Some(amount) => amount,
            None => {
                let explicit = ctx.storage.get_fee_config_txn(ctx.txn, target_year)?;
                ctx.calendar
                    .resolve_from(explicit, target_year)?
                    .config
                    .enrollment_fee
            }
        };

        // 3. DocumentApproved -> PaymentPending
        application.mark_payment_pending(amount, target_year)?;
        ctx.storage.store_application(ctx.txn, &application)?;

        // 4. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::FeeNoticeIssued,
            EventPayload::FeeNoticeIssued {
                application_id: self.application_id,
                user_id: application.user_id,
                amount,
                target_year,
            },
        );
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::calendar::FeeCalendar;
    use crate::membership::manager::ManagerError;
    use crate::membership::storage::MembershipStorage;
    use chrono::NaiveDate;
    use shared::membership::{
        AnnualFeeConfig, ApplicantSnapshot, ApplicationStatus, MembershipApplication,
        OwnershipCategory, VehicleSnapshot,
    };

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "test-cmd".to_string(),
            operator_id: Some(7),
            operator_name: Some("Admin Lee".to_string()),
            timestamp: 0,
        }
    }

    fn seed_approved_application(storage: &MembershipStorage) -> u64 {
        let txn = storage.begin_write().unwrap();
        let id = storage.next_entity_id(&txn).unwrap();
        let mut app = MembershipApplication::new(
            id,
            100,
            "APP-20250110-00001".to_string(),
            OwnershipCategory::Personal,
            ApplicantSnapshot {
                real_name: "Kim Minjun".to_string(),
                phone_number: "010-1234-5678".to_string(),
                email: "minjun@example.com".to_string(),
            },
            VehicleSnapshot {
                plate_number: "12가3456".to_string(),
                vin: "WP0ZZZ99ZTS392124".to_string(),
                model_name: "911 Carrera".to_string(),
            },
        );
        app.submit_documents().unwrap();
        app.approve_documents(7).unwrap();
        storage.store_application(&txn, &app).unwrap();
        txn.commit().unwrap();
        id
    }

    #[tokio::test]
    async fn test_explicit_amount_and_year() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));
        let app_id = seed_approved_application(&storage);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &calendar, chrono_tz::Asia::Seoul, 0);
        let events = MarkPaymentPendingAction {
            application_id: app_id,
            amount: Some(Decimal::new(250_000, 0)),
            target_year: Some(2026),
        }
        .execute(&mut ctx, &create_test_metadata())
        .await
        .unwrap();
        txn.commit().unwrap();

        assert_eq!(events.len(), 1);
        let app = storage.get_application(app_id).unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::PaymentPending);
        assert_eq!(app.payment_amount, Some(Decimal::new(250_000, 0)));
        assert_eq!(app.payment_target_year, Some(2026));
    }

    #[tokio::test]
    async fn test_amount_falls_back_to_synthesized_default() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));
        let app_id = seed_approved_application(&storage);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &calendar, chrono_tz::Asia::Seoul, 0);
        MarkPaymentPendingAction {
            application_id: app_id,
            amount: None,
            target_year: None,
        }
        .execute(&mut ctx, &create_test_metadata())
        .await
        .unwrap();
        txn.commit().unwrap();

        let app = storage.get_application(app_id).unwrap().unwrap();
        assert_eq!(app.payment_amount, Some(Decimal::new(200_000, 0)));
        assert!(app.payment_target_year.is_some());
    }

    #[tokio::test]
    async fn test_amount_falls_back_to_explicit_config() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));
        let app_id = seed_approved_application(&storage);

        let txn = storage.begin_write().unwrap();
        let config = AnnualFeeConfig::new(
            2027,
            NaiveDate::from_ymd_opt(2027, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2027, 1, 31).unwrap(),
            Decimal::new(300_000, 0),
            Decimal::new(220_000, 0),
            Some(7),
            None,
        )
        .unwrap();
        storage.store_fee_config(&txn, &config).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &calendar, chrono_tz::Asia::Seoul, 0);
        MarkPaymentPendingAction {
            application_id: app_id,
            amount: None,
            target_year: Some(2027),
        }
        .execute(&mut ctx, &create_test_metadata())
        .await
        .unwrap();
        txn.commit().unwrap();

        let app = storage.get_application(app_id).unwrap().unwrap();
        assert_eq!(app.payment_amount, Some(Decimal::new(300_000, 0)));
        assert_eq!(app.payment_target_year, Some(2027));
    }

    #[tokio::test]
    async fn test_notice_before_approval_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let calendar = FeeCalendar::new(Decimal::new(200_000, 0));

        let txn = storage.begin_write().unwrap();
        let id = storage.next_entity_id(&txn).unwrap();
        let app = MembershipApplication::new(
            id,
            100,
            "APP-20250110-00001".to_string(),
            OwnershipCategory::Personal,
            ApplicantSnapshot {
                real_name: "Kim Minjun".to_string(),
                phone_number: "010-1234-5678".to_string(),
                email: "minjun@example.com".to_string(),
            },
            VehicleSnapshot {
                plate_number: "12가3456".to_string(),
                vin: "WP0ZZZ99ZTS392124".to_string(),
                model_name: "911 Carrera".to_string(),
            },
        );
        storage.store_application(&txn, &app).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, &calendar, chrono_tz::Asia::Seoul, 0);
        let result = MarkPaymentPendingAction {
            application_id: id,
            amount: None,
            target_year: None,
        }
        .execute(&mut ctx, &create_test_metadata())
        .await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::InvalidTransition {
                status: ApplicationStatus::DocumentPending,
                ..
            }))
        ));
    }
}
