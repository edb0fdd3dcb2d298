// Fuel log endpoints

use serde::Serialize;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{Fuel, FuelCreate, Id, Page};

const FUEL_PATH: &str = "fuel/";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListFuelParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

pub async fn list(client: &ApiClient, params: &ListFuelParams) -> Result<Page<Fuel>> {
    client.get_with_query(FUEL_PATH, params).await
}

pub async fn create(client: &ApiClient, payload: &FuelCreate) -> Result<Fuel> {
    client.post(FUEL_PATH, payload).await
}
