// Insurance policy endpoints

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{Id, Insurance, InsuranceCreate, Page};

const INSURANCES_PATH: &str = "insurances/";

/// Filters for the insurance list; date bounds are inclusive
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListInsurancesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_type: Option<String>,
    #[serde(rename = "start_date__gte", skip_serializing_if = "Option::is_none")]
    pub start_date_from: Option<NaiveDate>,
    #[serde(rename = "start_date__lte", skip_serializing_if = "Option::is_none")]
    pub start_date_to: Option<NaiveDate>,
    #[serde(rename = "end_date__gte", skip_serializing_if = "Option::is_none")]
    pub end_date_from: Option<NaiveDate>,
    #[serde(rename = "end_date__lte", skip_serializing_if = "Option::is_none")]
    pub end_date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

pub async fn list(client: &ApiClient, params: &ListInsurancesParams) -> Result<Page<Insurance>> {
    client.get_with_query(INSURANCES_PATH, params).await
}

pub async fn create(client: &ApiClient, payload: &InsuranceCreate) -> Result<Insurance> {
    client.post(INSURANCES_PATH, payload).await
}
