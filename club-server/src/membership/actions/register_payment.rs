//! RegisterPayment command handler

use crate::membership::manager::ManagerResult;
use crate::membership::traits::{CommandContext, CommandHandler, CommandMetadata};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use shared::membership::{
    DomainError, EventPayload, FeeType, MembershipEvent, MembershipEventType, PaymentRecord,
};

/// Record a reported bank deposit in the ledger
///
/// An annual deposit without an explicit target year is dated through the fee
/// calendar: inside the carry-over window it settles the previous year.
#[derive(Debug, Clone)]
pub struct RegisterPaymentAction {
    pub user_id: u64,
    pub application_id: Option<u64>,
    pub fee_type: FeeType,
    pub target_year: Option<i32>,
    pub amount: Decimal,
    pub depositor_name: String,
    pub deposit_date: NaiveDate,
}

#[async_trait]
impl CommandHandler for RegisterPaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> ManagerResult<Vec<MembershipEvent>> {
        // 1. Fee-type specific checks and target-year resolution
        let target_year = match self.fee_type {
            FeeType::Enrollment => {
                let application_id = self.application_id.ok_or_else(|| {
                    DomainError::InvalidInput(
                        "enrollment fee payment requires an application reference".to_string(),
                    )
                })?;
                let application = ctx
                    .storage
                    .get_application_txn(ctx.txn, application_id)?
                    .ok_or(DomainError::ApplicationNotFound(application_id))?;
                if application.user_id != self.user_id {
                    return Err(DomainError::InvalidInput(format!(
                        "application {application_id} does not belong to user {}",
                        self.user_id
                    ))
                    .into());
                }
                if ctx
                    .storage
                    .get_confirmed_enrollment_txn(ctx.txn, application_id)?
                    .is_some()
                {
                    return Err(DomainError::DuplicateEnrollmentPayment { application_id }.into());
                }
                self.target_year.or(application.payment_target_year)
            }
            FeeType::Annual => {
                let year = match self.target_year {
                    Some(year) => year,
                    None => {
                        // The deposit year's calendar decides which membership
                        // year the money settles
                        let deposit_year = self.deposit_date.year();
                        let explicit = ctx.storage.get_fee_config_txn(ctx.txn, deposit_year)?;
                        let resolved = ctx.calendar.resolve_from(explicit, deposit_year)?;
                        ctx.calendar.effective_year(&resolved.config, self.deposit_date)
                    }
                };
                if ctx
                    .storage
                    .get_confirmed_annual_txn(ctx.txn, self.user_id, year)?
                    .is_some()
                {
                    return Err(DomainError::DuplicateAnnualPayment {
                        user_id: self.user_id,
                        target_year: year,
                    }
                    .into());
                }
                Some(year)
            }
        };

        // 2. Create the pending ledger record
        let id = ctx.storage.next_entity_id(ctx.txn)?;
        let payment = PaymentRecord::new(
            id,
            self.user_id,
            self.application_id,
            self.fee_type,
            target_year,
            self.amount,
            self.depositor_name.clone(),
            self.deposit_date,
        )?;
        ctx.storage.store_payment(ctx.txn, &payment)?;

        // 3. Emit
        let event = metadata.event(
            ctx.next_sequence(),
            MembershipEventType::PaymentRegistered,
            EventPayload::PaymentRegistered {
                payment_id: id,
                user_id: self.user_id,
                fee_type: self.fee_type,
                application_id: self.application_id,
                target_year,
                amount: self.amount,
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
    use shared::membership::{
        ApplicantSnapshot, MembershipApplication, OwnershipCategory, PaymentStatus,
        VehicleSnapshot,
    };

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "test-cmd".to_string(),
            operator_id: Some(7),
            operator_name: Some("Admin Lee".to_string()),
            timestamp: 0,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_application(storage: &MembershipStorage, user_id: u64) -> u64 {
        let txn = storage.begin_write().unwrap();
        let id = storage.next_entity_id(&txn).unwrap();
        let app = MembershipApplication::new(
            id,
            user_id,
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
        id
    }

    async fn register(
        storage: &MembershipStorage,
        action: RegisterPaymentAction,
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
    async fn test_register_enrollment_payment() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let app_id = seed_application(&storage, 100);

        let events = register(
            &storage,
            RegisterPaymentAction {
                user_id: 100,
                application_id: Some(app_id),
                fee_type: FeeType::Enrollment,
                target_year: Some(2025),
                amount: Decimal::new(200_000, 0),
                depositor_name: "Kim Minjun".to_string(),
                deposit_date: date(2025, 1, 10),
            },
        )
        .await
        .unwrap();

        let payment_id = match &events[0].payload {
            EventPayload::PaymentRegistered { payment_id, .. } => *payment_id,
            other => panic!("Expected PaymentRegistered payload, got {other:?}"),
        };
        let payment = storage.get_payment(payment_id).unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.application_id, Some(app_id));
        assert_eq!(payment.target_year, Some(2025));
    }

    #[tokio::test]
    async fn test_enrollment_against_foreign_application_fails() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let app_id = seed_application(&storage, 100);

        let result = register(
            &storage,
            RegisterPaymentAction {
                user_id: 200,
                application_id: Some(app_id),
                fee_type: FeeType::Enrollment,
                target_year: None,
                amount: Decimal::new(200_000, 0),
                depositor_name: "Park Jisoo".to_string(),
                deposit_date: date(2025, 1, 10),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::InvalidInput(_)))
        ));
    }

    #[tokio::test]
    async fn test_annual_target_year_from_carry_over_window() {
        let storage = MembershipStorage::open_in_memory().unwrap();

        // Jan 10 falls inside the synthesized carry-over window (Jan 1-15),
        // so the deposit settles the previous membership year
        let events = register(
            &storage,
            RegisterPaymentAction {
                user_id: 100,
                application_id: None,
                fee_type: FeeType::Annual,
                target_year: None,
                amount: Decimal::new(200_000, 0),
                depositor_name: "Kim Minjun".to_string(),
                deposit_date: date(2025, 1, 10),
            },
        )
        .await
        .unwrap();

        match &events[0].payload {
            EventPayload::PaymentRegistered { target_year, .. } => {
                assert_eq!(*target_year, Some(2024));
            }
            other => panic!("Expected PaymentRegistered payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_annual_target_year_after_carry_over_window() {
        let storage = MembershipStorage::open_in_memory().unwrap();

        let events = register(
            &storage,
            RegisterPaymentAction {
                user_id: 100,
                application_id: None,
                fee_type: FeeType::Annual,
                target_year: None,
                amount: Decimal::new(200_000, 0),
                depositor_name: "Kim Minjun".to_string(),
                deposit_date: date(2025, 3, 2),
            },
        )
        .await
        .unwrap();

        match &events[0].payload {
            EventPayload::PaymentRegistered { target_year, .. } => {
                assert_eq!(*target_year, Some(2025));
            }
            other => panic!("Expected PaymentRegistered payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_annual_for_settled_year_rejected() {
        let storage = MembershipStorage::open_in_memory().unwrap();

        // A confirmed annual payment already occupies (100, 2025)
        let txn = storage.begin_write().unwrap();
        storage.set_confirmed_annual(&txn, 100, 2025, 77).unwrap();
        txn.commit().unwrap();

        let result = register(
            &storage,
            RegisterPaymentAction {
                user_id: 100,
                application_id: None,
                fee_type: FeeType::Annual,
                target_year: Some(2025),
                amount: Decimal::new(200_000, 0),
                depositor_name: "Kim Minjun".to_string(),
                deposit_date: date(2025, 3, 2),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::DuplicateAnnualPayment {
                user_id: 100,
                target_year: 2025
            }))
        ));
    }

    #[tokio::test]
    async fn test_enrollment_for_settled_application_rejected() {
        let storage = MembershipStorage::open_in_memory().unwrap();
        let app_id = seed_application(&storage, 100);

        let txn = storage.begin_write().unwrap();
        storage.set_confirmed_enrollment(&txn, app_id, 77).unwrap();
        txn.commit().unwrap();

        let result = register(
            &storage,
            RegisterPaymentAction {
                user_id: 100,
                application_id: Some(app_id),
                fee_type: FeeType::Enrollment,
                target_year: None,
                amount: Decimal::new(200_000, 0),
                depositor_name: "Kim Minjun".to_string(),
                deposit_date: date(2025, 1, 10),
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(ManagerError::Domain(DomainError::DuplicateEnrollmentPayment { .. }))
        ));
    }
}
