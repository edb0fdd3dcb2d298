// Technical inspection endpoints

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{Id, Inspection, InspectionCreate, Page};

const INSPECTIONS_PATH: &str = "inspections/";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListInspectionsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car: Option<Id>,
    #[serde(rename = "inspected_at__gte", skip_serializing_if = "Option::is_none")]
    pub inspected_from: Option<NaiveDate>,
    #[serde(rename = "inspected_at__lte", skip_serializing_if = "Option::is_none")]
    pub inspected_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

pub async fn list(client: &ApiClient, params: &ListInspectionsParams) -> Result<Page<Inspection>> {
    client.get_with_query(INSPECTIONS_PATH, params).await
}

pub async fn create(client: &ApiClient, payload: &InspectionCreate) -> Result<Inspection> {
    client.post(INSPECTIONS_PATH, payload).await
}
