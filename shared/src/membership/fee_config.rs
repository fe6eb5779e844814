//! Annual fee configuration
//!
//! One config per membership year: the renewal window, the carry-over
//! deadline inside it, and the two fee amounts. Date predicates here are the
//! calendar arithmetic; resolution and synthesized defaults live in the
//! server's calendar module.

use super::error::{DomainError, DomainResult};
use crate::util::now_millis;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a resolved fee configuration came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigSource {
    /// Stored by an administrator
    Explicit,
    /// Built-in fallback, never persisted
    Synthesized,
}

/// Fee schedule for one membership year
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnualFeeConfig {
    /// Membership year this config governs (storage key)
    pub target_year: i32,
    /// Last day a payment still credits the previous year
    pub carry_over_deadline: NaiveDate,
    /// First day of the renewal window
    pub renewal_start_date: NaiveDate,
    /// Last day of the renewal window
    pub renewal_deadline: NaiveDate,
    /// Enrollment fee (KRW)
    pub enrollment_fee: Decimal,
    /// Annual fee (KRW)
    pub annual_fee: Decimal,
    /// Admin who stored the config; empty for synthesized defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configured_by: Option<u64>,
    /// Free-form admin notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last mutation timestamp (Unix millis)
    pub updated_at: i64,
}

fn check_date_order(
    renewal_start_date: NaiveDate,
    carry_over_deadline: NaiveDate,
    renewal_deadline: NaiveDate,
) -> DomainResult<()> {
    if renewal_start_date > carry_over_deadline || carry_over_deadline > renewal_deadline {
        return Err(DomainError::InvalidFeePeriod);
    }
    Ok(())
}

impl AnnualFeeConfig {
    /// Create a config, enforcing
    /// `renewal_start_date <= carry_over_deadline <= renewal_deadline`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        target_year: i32,
        carry_over_deadline: NaiveDate,
        renewal_start_date: NaiveDate,
        renewal_deadline: NaiveDate,
        enrollment_fee: Decimal,
        annual_fee: Decimal,
        configured_by: Option<u64>,
        notes: Option<String>,
    ) -> DomainResult<Self> {
        check_date_order(renewal_start_date, carry_over_deadline, renewal_deadline)?;
        let now = now_millis();
        Ok(Self {
            target_year,
            carry_over_deadline,
            renewal_start_date,
            renewal_deadline,
            enrollment_fee,
            annual_fee,
            configured_by,
            notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the schedule, re-checking the date ordering
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        carry_over_deadline: NaiveDate,
        renewal_start_date: NaiveDate,
        renewal_deadline: NaiveDate,
        enrollment_fee: Decimal,
        annual_fee: Decimal,
        configured_by: Option<u64>,
        notes: Option<String>,
    ) -> DomainResult<()> {
        check_date_order(renewal_start_date, carry_over_deadline, renewal_deadline)?;
        self.carry_over_deadline = carry_over_deadline;
        self.renewal_start_date = renewal_start_date;
        self.renewal_deadline = renewal_deadline;
        self.enrollment_fee = enrollment_fee;
        self.annual_fee = annual_fee;
        self.configured_by = configured_by;
        self.notes = notes;
        self.updated_at = now_millis();
        Ok(())
    }

    /// Inside the carry-over window: payment still credits the previous year.
    /// Both boundaries inclusive.
    pub fn is_carry_over_period(&self, date: NaiveDate) -> bool {
        self.renewal_start_date <= date && date <= self.carry_over_deadline
    }

    /// Inside the renewal window. Both boundaries inclusive.
    pub fn is_renewal_period(&self, date: NaiveDate) -> bool {
        self.renewal_start_date <= date && date <= self.renewal_deadline
    }

    /// Past the renewal deadline
    pub fn is_overdue(&self, date: NaiveDate) -> bool {
        date > self.renewal_deadline
    }
}
