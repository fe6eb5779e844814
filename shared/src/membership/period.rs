//! Membership period aggregate
//!
//! One record per (user, membership year), linked to the payment that bought
//! it. The (user, year) uniqueness lives in the storage index; the terminal
//! transition rules live here.

use super::error::{DomainError, DomainResult};
use super::types::PeriodStatus;
use crate::util::now_millis;
use serde::{Deserialize, Serialize};

/// One year of membership for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipPeriod {
    /// Surrogate id from the storage counter
    pub id: u64,
    /// Member the period belongs to
    pub user_id: u64,
    /// First covered year
    pub start_year: i32,
    /// Last covered year, equal to start_year for ordinary periods
    pub end_year: i32,
    /// Period state
    pub status: PeriodStatus,
    /// True when created by renewal, false for the initial enrollment period
    pub is_renewed: bool,
    /// Confirmed payment that bought this period
    pub payment_record_id: u64,
    /// When the period lapsed (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<i64>,
    /// When the expiration notice went out (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_notified_at: Option<i64>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last mutation timestamp (Unix millis)
    pub updated_at: i64,
}

impl MembershipPeriod {
    /// Create an active period covering a single year
    pub fn new(id: u64, user_id: u64, year: i32, payment_record_id: u64, is_renewed: bool) -> Self {
        let now = now_millis();
        Self {
            id,
            user_id,
            start_year: year,
            end_year: year,
            status: PeriodStatus::Active,
            is_renewed,
            payment_record_id,
            expired_at: None,
            expiration_notified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PeriodStatus::Active
    }

    pub fn covers_year(&self, year: i32) -> bool {
        self.start_year <= year && year <= self.end_year
    }

    /// Let the period lapse. Returns `Ok(false)` when it already had, so
    /// repeated expiry sweeps stay silent; a cancelled period cannot expire.
    pub fn expire(&mut self) -> DomainResult<bool> {
        match self.status {
            PeriodStatus::Active => {
                self.status = PeriodStatus::Expired;
                self.expired_at = Some(now_millis());
                self.updated_at = now_millis();
                Ok(true)
            }
            PeriodStatus::Expired => Ok(false),
            PeriodStatus::Cancelled => Err(DomainError::InvalidPeriodState {
                status: PeriodStatus::Cancelled,
                action: "expire",
            }),
        }
    }

    /// Revoke the period. Same no-op rule as [`expire`](Self::expire), and an
    /// expired period cannot be cancelled.
    pub fn cancel(&mut self) -> DomainResult<bool> {
        match self.status {
            PeriodStatus::Active => {
                self.status = PeriodStatus::Cancelled;
                self.updated_at = now_millis();
                Ok(true)
            }
            PeriodStatus::Cancelled => Ok(false),
            PeriodStatus::Expired => Err(DomainError::InvalidPeriodState {
                status: PeriodStatus::Expired,
                action: "cancel",
            }),
        }
    }

    /// Record that the member was told the period is about to lapse.
    /// Returns false when the notice was already recorded.
    pub fn mark_expiration_notified(&mut self) -> bool {
        if self.expiration_notified_at.is_some() {
            return false;
        }
        self.expiration_notified_at = Some(now_millis());
        self.updated_at = now_millis();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_period_is_active_single_year() {
        let period = MembershipPeriod::new(1, 100, 2025, 50, false);
        assert_eq!(period.status, PeriodStatus::Active);
        assert!(period.is_active());
        assert_eq!(period.start_year, 2025);
        assert_eq!(period.end_year, 2025);
        assert!(!period.is_renewed);
        assert_eq!(period.payment_record_id, 50);
    }

    #[test]
    fn test_covers_year() {
        let period = MembershipPeriod::new(1, 100, 2025, 50, false);
        assert!(period.covers_year(2025));
        assert!(!period.covers_year(2024));
        assert!(!period.covers_year(2026));
    }

    #[test]
    fn test_expire_then_double_expire_is_noop() {
        let mut period = MembershipPeriod::new(1, 100, 2025, 50, false);

        assert!(period.expire().unwrap());
        assert_eq!(period.status, PeriodStatus::Expired);
        assert!(period.expired_at.is_some());

        // Second expire reports no change
        assert!(!period.expire().unwrap());
        assert_eq!(period.status, PeriodStatus::Expired);
    }

    #[test]
    fn test_cancel_then_double_cancel_is_noop() {
        let mut period = MembershipPeriod::new(1, 100, 2025, 50, true);

        assert!(period.cancel().unwrap());
        assert_eq!(period.status, PeriodStatus::Cancelled);

        assert!(!period.cancel().unwrap());
    }

    #[test]
    fn test_cancel_after_expire_fails() {
        let mut period = MembershipPeriod::new(1, 100, 2025, 50, false);
        period.expire().unwrap();

        let result = period.cancel();
        assert!(matches!(
            result,
            Err(DomainError::InvalidPeriodState {
                status: PeriodStatus::Expired,
                action: "cancel",
            })
        ));
    }

    #[test]
    fn test_expire_after_cancel_fails() {
        let mut period = MembershipPeriod::new(1, 100, 2025, 50, false);
        period.cancel().unwrap();

        let result = period.expire();
        assert!(matches!(
            result,
            Err(DomainError::InvalidPeriodState {
                status: PeriodStatus::Cancelled,
                action: "expire",
            })
        ));
    }

    #[test]
    fn test_mark_expiration_notified_once() {
        let mut period = MembershipPeriod::new(1, 100, 2025, 50, false);
        assert!(period.expiration_notified_at.is_none());

        assert!(period.mark_expiration_notified());
        let first = period.expiration_notified_at;
        assert!(first.is_some());

        // Repeat keeps the original stamp
        assert!(!period.mark_expiration_notified());
        assert_eq!(period.expiration_notified_at, first);
    }
}
