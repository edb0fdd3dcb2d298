// Fleet resources: cars and their fuel, insurance and inspection records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Id;

/// Operational status of a car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Active => "ACTIVE",
            CarStatus::Inactive => "INACTIVE",
            CarStatus::Maintenance => "MAINTENANCE",
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(CarStatus::Active),
            "INACTIVE" => Ok(CarStatus::Inactive),
            "MAINTENANCE" => Ok(CarStatus::Maintenance),
            other => Err(format!("unknown car status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Id>,
    pub region: String,
    pub brand: String,
    pub title: String,
    pub numplate: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub vin: Option<String>,
    pub fueltype: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub drivers_phone: Option<String>,
    #[serde(default)]
    pub fuel_card: String,
    pub status: CarStatus,
    #[serde(default)]
    pub commissioned_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row of the car list screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarListItem {
    pub id: Id,
    pub brand: String,
    pub title: String,
    pub numplate: String,
    pub status: CarStatus,
    #[serde(default)]
    pub driver: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarCreate {
    pub region: String,
    pub brand: String,
    pub title: String,
    pub numplate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    pub fueltype: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drivers_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CarStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commissioned_at: Option<NaiveDate>,
}

/// Monthly fuel log of a car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fuel {
    pub id: Id,
    pub car: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_numplate: Option<String>,
    pub year: i32,
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_name: Option<String>,
    pub liters: u64,
    pub total_cost: u64,
    pub monthly_mileage: u64,
    /// Decimal string as rendered by the backend (liters per 100 km)
    #[serde(default)]
    pub consumption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelCreate {
    pub car: Id,
    pub year: i32,
    pub month: u32,
    pub liters: u64,
    pub total_cost: u64,
    pub monthly_mileage: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    pub id: Id,
    pub car: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_numplate: Option<String>,
    pub insurance_type: String,
    pub number: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cost: u64,
}

impl Insurance {
    /// Whether the policy covers the given day
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsuranceCreate {
    pub car: Id,
    pub insurance_type: String,
    pub number: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cost: u64,
}

/// Technical inspection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: Id,
    pub car: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_numplate: Option<String>,
    pub number: String,
    pub inspected_at: NaiveDate,
    pub cost: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionCreate {
    pub car: Id,
    pub number: String,
    pub inspected_at: NaiveDate,
    pub cost: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_car_type_field_rename() {
        let car: Car = serde_json::from_value(json!({
            "id": 4,
            "region": "Bishkek",
            "brand": "Toyota",
            "title": "Camry",
            "numplate": "01KG777AAA",
            "year": 2019,
            "vin": null,
            "fueltype": "petrol",
            "type": "sedan",
            "driver": "-",
            "drivers_phone": null,
            "fuel_card": "-",
            "status": "MAINTENANCE",
            "commissioned_at": "2020-03-01",
            "created_at": "2024-01-10T08:00:00Z"
        }))
        .unwrap();

        assert_eq!(car.kind, "sedan");
        assert_eq!(car.status, CarStatus::Maintenance);
        assert_eq!(car.commissioned_at, NaiveDate::from_ymd_opt(2020, 3, 1));
        assert!(car.created_at.is_some());
    }

    #[test]
    fn test_car_create_serialization() {
        let payload = CarCreate {
            region: "Osh".into(),
            brand: "Honda".into(),
            title: "Fit".into(),
            numplate: "02KG001BBB".into(),
            year: None,
            vin: None,
            fueltype: "petrol".into(),
            kind: "hatchback".into(),
            driver: None,
            drivers_phone: None,
            fuel_card: None,
            status: Some(CarStatus::Active),
            commissioned_at: None,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "hatchback");
        assert_eq!(value["status"], "ACTIVE");
        assert!(value.get("year").is_none());
    }

    #[test]
    fn test_insurance_activity_window() {
        let insurance = Insurance {
            id: 1,
            car: 2,
            car_numplate: None,
            insurance_type: "OSAGO".into(),
            number: "A-1".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            cost: 4500,
        };

        assert!(insurance.is_active_on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert!(insurance.is_active_on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!insurance.is_active_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }

    #[test]
    fn test_car_status_parsing() {
        assert_eq!("maintenance".parse::<CarStatus>(), Ok(CarStatus::Maintenance));
        assert!("broken".parse::<CarStatus>().is_err());
    }
}
