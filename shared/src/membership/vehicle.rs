//! Member vehicle roster aggregate
//!
//! Vehicles registered by full members. Selling a vehicle does not end
//! membership at once: the member keeps privileges through a six-month grace
//! window counted from the sale date.

use super::error::{DomainError, DomainResult};
use super::types::{OwnershipCategory, VehicleStatus};
use crate::util::now_millis;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// One vehicle on the club roster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberVehicle {
    /// Surrogate id from the storage counter
    pub id: u64,
    /// Owning member
    pub user_id: u64,
    /// License plate number
    pub plate_number: String,
    /// Vehicle identification number, unique across the roster
    pub vin: String,
    /// Manufacturer model name
    pub model_name: String,
    /// Ownership category
    pub category: OwnershipCategory,
    /// Roster state
    pub status: VehicleStatus,
    /// At most one primary vehicle per member
    pub is_primary: bool,
    /// Registration timestamp (Unix millis)
    pub registered_at: i64,
    /// Sale date, set by mark_sold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sold_at: Option<NaiveDate>,
    /// Last day of the post-sale grace window, sale date plus six months
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_end: Option<NaiveDate>,
    /// Last mutation timestamp (Unix millis)
    pub updated_at: i64,
}

impl MemberVehicle {
    /// Register an active vehicle
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        user_id: u64,
        plate_number: String,
        vin: String,
        model_name: String,
        category: OwnershipCategory,
        is_primary: bool,
    ) -> Self {
        let now = now_millis();
        Self {
            id,
            user_id,
            plate_number,
            vin,
            model_name,
            category,
            status: VehicleStatus::Active,
            is_primary,
            registered_at: now,
            sold_at: None,
            grace_period_end: None,
            updated_at: now,
        }
    }

    /// Still counts toward the member's vehicle requirement
    pub fn is_active_or_grace(&self) -> bool {
        matches!(self.status, VehicleStatus::Active | VehicleStatus::GracePeriod)
    }

    /// Record the sale. The vehicle enters the grace window ending six
    /// calendar months after the sale date, and loses its primary flag.
    /// Returns the computed grace window end.
    pub fn mark_sold(&mut self, sold_at: NaiveDate) -> DomainResult<NaiveDate> {
        if self.status != VehicleStatus::Active {
            return Err(DomainError::InvalidVehicleState {
                status: self.status,
                action: "mark sold",
            });
        }
        let grace_end = sold_at
            .checked_add_months(Months::new(6))
            .ok_or_else(|| DomainError::InvalidInput("sale date out of range".to_string()))?;
        self.status = VehicleStatus::GracePeriod;
        self.sold_at = Some(sold_at);
        self.grace_period_end = Some(grace_end);
        self.is_primary = false;
        self.updated_at = now_millis();
        Ok(grace_end)
    }

    /// Flip the primary flag
    pub fn set_primary(&mut self, primary: bool) {
        self.is_primary = primary;
        self.updated_at = now_millis();
    }

    /// Correct plate number or model name
    pub fn update_details(&mut self, plate_number: Option<String>, model_name: Option<String>) {
        if let Some(plate) = plate_number {
            self.plate_number = plate;
        }
        if let Some(model) = model_name {
            self.model_name = model;
        }
        self.updated_at = now_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_vehicle() -> MemberVehicle {
        MemberVehicle::new(
            1,
            100,
            "12가3456".to_string(),
            "WP0ZZZ99ZTS392124".to_string(),
            "911 Carrera".to_string(),
            OwnershipCategory::Personal,
            true,
        )
    }

    #[test]
    fn test_new_vehicle_is_active() {
        let vehicle = create_test_vehicle();
        assert_eq!(vehicle.status, VehicleStatus::Active);
        assert!(vehicle.is_primary);
        assert!(vehicle.is_active_or_grace());
        assert!(vehicle.sold_at.is_none());
    }

    #[test]
    fn test_mark_sold_enters_grace_period() {
        let mut vehicle = create_test_vehicle();
        vehicle.mark_sold(date(2025, 1, 10)).unwrap();

        assert_eq!(vehicle.status, VehicleStatus::GracePeriod);
        assert_eq!(vehicle.sold_at, Some(date(2025, 1, 10)));
        assert_eq!(vehicle.grace_period_end, Some(date(2025, 7, 10)));
        assert!(!vehicle.is_primary);
        assert!(vehicle.is_active_or_grace());
    }

    #[test]
    fn test_grace_period_end_clamps_month_end() {
        let mut vehicle = create_test_vehicle();
        // Aug 31 + 6 months lands on Feb 28 (2025 is not a leap year)
        vehicle.mark_sold(date(2024, 8, 31)).unwrap();
        assert_eq!(vehicle.grace_period_end, Some(date(2025, 2, 28)));
    }

    #[test]
    fn test_mark_sold_twice_fails() {
        let mut vehicle = create_test_vehicle();
        vehicle.mark_sold(date(2025, 1, 10)).unwrap();

        let result = vehicle.mark_sold(date(2025, 2, 1));
        assert!(matches!(
            result,
            Err(DomainError::InvalidVehicleState {
                status: VehicleStatus::GracePeriod,
                action: "mark sold",
            })
        ));
    }

    #[test]
    fn test_set_primary() {
        let mut vehicle = create_test_vehicle();
        vehicle.set_primary(false);
        assert!(!vehicle.is_primary);
        vehicle.set_primary(true);
        assert!(vehicle.is_primary);
    }

    #[test]
    fn test_update_details_partial() {
        let mut vehicle = create_test_vehicle();
        vehicle.update_details(Some("34나5678".to_string()), None);
        assert_eq!(vehicle.plate_number, "34나5678");
        assert_eq!(vehicle.model_name, "911 Carrera");

        vehicle.update_details(None, Some("911 Turbo S".to_string()));
        assert_eq!(vehicle.model_name, "911 Turbo S");
    }
}
