//! Annual fee calendar resolution
//!
//! Every target year has a fee calendar: renewal window, carry-over deadline
//! and fee amounts. Years without an explicit [`AnnualFeeConfig`] get a
//! synthesized default that is returned but never persisted, so configuring
//! the year later wins retroactively.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::membership::{AnnualFeeConfig, ConfigSource, DomainError, DomainResult};
use shared::util::now_millis;

/// A fee calendar together with where it came from
#[derive(Debug, Clone)]
pub struct ResolvedFeeConfig {
    pub config: AnnualFeeConfig,
    pub source: ConfigSource,
}

impl ResolvedFeeConfig {
    pub fn is_synthesized(&self) -> bool {
        self.source == ConfigSource::Synthesized
    }
}

/// Resolves fee calendars and decides which year a deposit pays for
#[derive(Debug, Clone)]
pub struct FeeCalendar {
    default_fee: Decimal,
}

impl FeeCalendar {
    pub fn new(default_fee: Decimal) -> Self {
        Self { default_fee }
    }

    /// Fee amount used when a year has no explicit configuration
    pub fn default_fee(&self) -> Decimal {
        self.default_fee
    }

    /// Build the default calendar for a year
    ///
    /// Renewal window January 1 through 31, carry-over deadline January 15,
    /// both fees at the default amount. The result is never written to
    /// storage.
    pub fn synthesize(&self, year: i32) -> DomainResult<AnnualFeeConfig> {
        let start = first_month_date(year, 1)?;
        let carry_over = first_month_date(year, 15)?;
        let deadline = first_month_date(year, 31)?;

        let now = now_millis();
        Ok(AnnualFeeConfig {
            target_year: year,
            carry_over_deadline: carry_over,
            renewal_start_date: start,
            renewal_deadline: deadline,
            enrollment_fee: self.default_fee,
            annual_fee: self.default_fee,
            configured_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Pick the explicit calendar when one exists, otherwise synthesize
    pub fn resolve_from(
        &self,
        explicit: Option<AnnualFeeConfig>,
        year: i32,
    ) -> DomainResult<ResolvedFeeConfig> {
        match explicit {
            Some(config) => Ok(ResolvedFeeConfig {
                config,
                source: ConfigSource::Explicit,
            }),
            None => Ok(ResolvedFeeConfig {
                config: self.synthesize(year)?,
                source: ConfigSource::Synthesized,
            }),
        }
    }

    /// The membership year a deposit pays for
    ///
    /// `config` is the calendar of the deposit's own calendar year. A deposit
    /// inside that year's carry-over window settles the PREVIOUS year's fee;
    /// anything later pays for the deposit year itself.
    pub fn effective_year(&self, config: &AnnualFeeConfig, deposit_date: NaiveDate) -> i32 {
        if config.is_carry_over_period(deposit_date) {
            config.target_year - 1
        } else {
            config.target_year
        }
    }
}

fn first_month_date(year: i32, day: u32) -> DomainResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, day)
        .ok_or_else(|| DomainError::InvalidInput(format!("target year {year} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_synthesized_defaults() {
        let calendar = FeeCalendar::new(Decimal::from(200_000));
        let config = calendar.synthesize(2025).unwrap();

        assert_eq!(config.renewal_start_date, date(2025, 1, 1));
        assert_eq!(config.carry_over_deadline, date(2025, 1, 15));
        assert_eq!(config.renewal_deadline, date(2025, 1, 31));
        assert_eq!(config.enrollment_fee, Decimal::from(200_000));
        assert_eq!(config.annual_fee, Decimal::from(200_000));
        assert_eq!(config.configured_by, None);
    }

    #[test]
    fn test_resolve_prefers_explicit() {
        let calendar = FeeCalendar::new(Decimal::from(200_000));
        let explicit = AnnualFeeConfig::new(
            2025,
            date(2025, 1, 20),
            date(2025, 1, 1),
            date(2025, 2, 28),
            Decimal::from(300_000),
            Decimal::from(250_000),
            Some(7),
            None,
        )
        .unwrap();

        let resolved = calendar.resolve_from(Some(explicit), 2025).unwrap();
        assert!(!resolved.is_synthesized());
        assert_eq!(resolved.config.annual_fee, Decimal::from(250_000));

        let resolved = calendar.resolve_from(None, 2025).unwrap();
        assert!(resolved.is_synthesized());
        assert_eq!(resolved.config.annual_fee, Decimal::from(200_000));
    }

    #[test]
    fn test_effective_year_carry_over_boundaries() {
        let calendar = FeeCalendar::new(Decimal::from(200_000));
        let config = calendar.synthesize(2025).unwrap();

        // Inside the window, deadline day included: credited to 2024
        assert_eq!(calendar.effective_year(&config, date(2025, 1, 1)), 2024);
        assert_eq!(calendar.effective_year(&config, date(2025, 1, 15)), 2024);
        // First day past the deadline pays for 2025
        assert_eq!(calendar.effective_year(&config, date(2025, 1, 16)), 2025);
        assert_eq!(calendar.effective_year(&config, date(2025, 6, 1)), 2025);
    }

    #[test]
    fn test_effective_year_with_custom_window() {
        let calendar = FeeCalendar::new(Decimal::from(200_000));
        let config = AnnualFeeConfig::new(
            2025,
            date(2025, 2, 10),
            date(2025, 1, 5),
            date(2025, 3, 1),
            Decimal::from(200_000),
            Decimal::from(200_000),
            Some(7),
            None,
        )
        .unwrap();

        // Before the renewal window opens nothing is carried over
        assert_eq!(calendar.effective_year(&config, date(2025, 1, 4)), 2025);
        assert_eq!(calendar.effective_year(&config, date(2025, 2, 10)), 2024);
        assert_eq!(calendar.effective_year(&config, date(2025, 2, 11)), 2025);
    }

    #[test]
    fn test_out_of_range_year() {
        let calendar = FeeCalendar::new(Decimal::from(200_000));
        assert!(calendar.synthesize(i32::MAX).is_err());
    }
}
