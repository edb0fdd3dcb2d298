// Data models for the fleet API
// Mirrors the JSON shapes served by the backend after envelope unwrapping

pub mod fleet;
pub mod report;
pub mod user;

pub use fleet::{
    Car, CarCreate, CarListItem, CarStatus, Fuel, FuelCreate, Inspection, InspectionCreate,
    Insurance, InsuranceCreate,
};
pub use report::{CarCostRow, CostFilters, CostTotals, MaintenanceCostsReport};
pub use user::{Language, MeUpdate, User, UserCreate, UserRole, UserUpdate};

use serde::{Deserialize, Serialize};

/// Database identifier used by every resource
pub type Id = i64;

/// Paginated list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
