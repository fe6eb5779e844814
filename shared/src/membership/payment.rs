//! Payment ledger records
//!
//! Reported bank deposits for enrollment and annual fees. A record moves
//! Pending → Confirmed → (Cancelled | Refunded); the at-most-one-confirmed
//! rule per (user, fee type, target year) is enforced by the storage index,
//! the status rules here.

use super::error::{DomainError, DomainResult};
use super::types::{FeeType, PaymentStatus};
use crate::util::now_millis;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One reported fee deposit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    /// Surrogate id from the storage counter
    pub id: u64,
    /// Paying user
    pub user_id: u64,
    /// Application settled by an enrollment fee; absent for annual fees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<u64>,
    /// Which fee this deposit settles
    pub fee_type: FeeType,
    /// Membership year the fee buys; required before a renewal can use it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_year: Option<i32>,
    /// Deposited amount (KRW)
    pub amount: Decimal,
    /// Name on the bank transfer
    pub depositor_name: String,
    /// Date the money arrived
    pub deposit_date: NaiveDate,
    /// Ledger state
    pub status: PaymentStatus,
    /// Admin who confirmed manually; None for automatic confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<u64>,
    /// Bank transaction id, set by automatic confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_tx_id: Option<String>,
    /// Bank account the deposit landed on, set by automatic confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    /// Confirmation timestamp (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    /// Why the record was cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// Admin who cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<u64>,
    /// Cancellation timestamp (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    /// Refunded amount, at most `amount`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Decimal>,
    /// Admin who issued the refund
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_by: Option<u64>,
    /// Refund timestamp (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_at: Option<i64>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last mutation timestamp (Unix millis)
    pub updated_at: i64,
}

impl PaymentRecord {
    /// Register a reported deposit in Pending.
    ///
    /// Enrollment fees must reference the application they settle; the amount
    /// must not be negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        user_id: u64,
        application_id: Option<u64>,
        fee_type: FeeType,
        target_year: Option<i32>,
        amount: Decimal,
        depositor_name: String,
        deposit_date: NaiveDate,
    ) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::InvalidInput(
                "payment amount must not be negative".to_string(),
            ));
        }
        if fee_type == FeeType::Enrollment && application_id.is_none() {
            return Err(DomainError::InvalidInput(
                "enrollment fee payment requires an application reference".to_string(),
            ));
        }

        let now = now_millis();
        Ok(Self {
            id,
            user_id,
            application_id,
            fee_type,
            target_year,
            amount,
            depositor_name,
            deposit_date,
            status: PaymentStatus::Pending,
            confirmed_by: None,
            bank_tx_id: None,
            bank_account: None,
            confirmed_at: None,
            cancel_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            refund_amount: None,
            refunded_by: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    fn check_confirmable(&self) -> DomainResult<()> {
        match self.status {
            PaymentStatus::Pending => Ok(()),
            PaymentStatus::Confirmed => Err(DomainError::PaymentAlreadyConfirmed(self.id)),
            status => Err(DomainError::InvalidPaymentStatus {
                status,
                action: "confirm",
            }),
        }
    }

    /// Admin confirmed the deposit by hand
    pub fn confirm_manual(&mut self, admin_id: u64) -> DomainResult<()> {
        self.check_confirmable()?;
        self.status = PaymentStatus::Confirmed;
        self.confirmed_by = Some(admin_id);
        self.confirmed_at = Some(now_millis());
        self.updated_at = now_millis();
        Ok(())
    }

    /// Bank feed matched the deposit. No admin involved: `confirmed_by` stays
    /// empty and the transaction metadata is kept instead.
    pub fn confirm_automatic(&mut self, bank_tx_id: String, bank_account: String) -> DomainResult<()> {
        self.check_confirmable()?;
        self.status = PaymentStatus::Confirmed;
        self.confirmed_by = None;
        self.bank_tx_id = Some(bank_tx_id);
        self.bank_account = Some(bank_account);
        self.confirmed_at = Some(now_millis());
        self.updated_at = now_millis();
        Ok(())
    }

    /// Cancel the record. Returns `Ok(false)` when it was already cancelled,
    /// so callers can skip event emission for the no-op.
    pub fn cancel(&mut self, reason: String, admin_id: u64) -> DomainResult<bool> {
        match self.status {
            PaymentStatus::Cancelled => Ok(false),
            PaymentStatus::Refunded => Err(DomainError::InvalidPaymentStatus {
                status: PaymentStatus::Refunded,
                action: "cancel",
            }),
            PaymentStatus::Pending | PaymentStatus::Confirmed => {
                self.status = PaymentStatus::Cancelled;
                self.cancel_reason = Some(reason);
                self.cancelled_by = Some(admin_id);
                self.cancelled_at = Some(now_millis());
                self.updated_at = now_millis();
                Ok(true)
            }
        }
    }

    /// Return money to the member. Only a confirmed deposit can be refunded;
    /// refunding the full amount is permitted, exceeding it is not.
    pub fn refund(&mut self, refund_amount: Decimal, admin_id: u64) -> DomainResult<()> {
        if self.status != PaymentStatus::Confirmed {
            return Err(DomainError::InvalidPaymentStatus {
                status: self.status,
                action: "refund",
            });
        }
        if refund_amount < Decimal::ZERO {
            return Err(DomainError::InvalidInput(
                "refund amount must not be negative".to_string(),
            ));
        }
        if refund_amount > self.amount {
            return Err(DomainError::RefundExceedsAmount {
                refund: refund_amount,
                amount: self.amount,
            });
        }
        self.status = PaymentStatus::Refunded;
        self.refund_amount = Some(refund_amount);
        self.refunded_by = Some(admin_id);
        self.refunded_at = Some(now_millis());
        self.updated_at = now_millis();
        Ok(())
    }
}
