// Cost reports

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{Id, MaintenanceCostsReport};

const MAINTENANCE_COSTS_PATH: &str = "reports/maintenance-costs/";

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceCostsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car: Option<Id>,
}

pub async fn maintenance_costs(
    client: &ApiClient,
    params: &MaintenanceCostsParams,
) -> Result<MaintenanceCostsReport> {
    client.get_with_query(MAINTENANCE_COSTS_PATH, params).await
}
