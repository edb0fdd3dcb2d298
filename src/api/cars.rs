// Car registry endpoints

use serde::Serialize;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{Car, CarCreate, CarListItem, CarStatus, Id, Page};

const CARS_PATH: &str = "cars/";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCarsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CarStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

pub async fn list(client: &ApiClient, params: &ListCarsParams) -> Result<Page<CarListItem>> {
    client.get_with_query(CARS_PATH, params).await
}

pub async fn get(client: &ApiClient, car_id: Id) -> Result<Car> {
    client.get(&super::detail_path(CARS_PATH, car_id)).await
}

pub async fn create(client: &ApiClient, payload: &CarCreate) -> Result<Car> {
    client.post(CARS_PATH, payload).await
}
