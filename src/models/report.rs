// Maintenance cost report

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceCostsReport {
    pub filters: CostFilters,
    pub totals: CostTotals,
    #[serde(default)]
    pub by_car: Vec<CarCostRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostFilters {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub car: Option<Id>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    pub part_total: i64,
    pub job_total: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarCostRow {
    pub car_id: Id,
    #[serde(rename = "car__numplate")]
    pub numplate: String,
    pub part_total: i64,
    pub job_total: i64,
    pub total: i64,
}

impl MaintenanceCostsReport {
    /// Rows ordered by total cost, most expensive first
    pub fn most_expensive(&self) -> Vec<&CarCostRow> {
        let mut rows: Vec<&CarCostRow> = self.by_car.iter().collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_deserialization() {
        let report: MaintenanceCostsReport = serde_json::from_value(json!({
            "filters": {"from": "2024-01-01", "to": null, "car": null},
            "totals": {"part_total": 1500, "job_total": 700, "total": 2200},
            "by_car": [
                {"car_id": 1, "car__numplate": "A", "part_total": 500, "job_total": 200, "total": 700},
                {"car_id": 2, "car__numplate": "B", "part_total": 1000, "job_total": 500, "total": 1500}
            ]
        }))
        .unwrap();

        assert_eq!(report.filters.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(report.totals.total, 2200);

        let ranked = report.most_expensive();
        assert_eq!(ranked[0].numplate, "B");
        assert_eq!(ranked[1].car_id, 1);
    }
}
