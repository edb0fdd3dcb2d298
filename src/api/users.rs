// Company user management endpoints

use serde::Serialize;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{Id, Page, User, UserCreate, UserUpdate};

const USERS_PATH: &str = "users/";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListUsersParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

pub async fn list(client: &ApiClient, params: &ListUsersParams) -> Result<Page<User>> {
    client.get_with_query(USERS_PATH, params).await
}

pub async fn create(client: &ApiClient, payload: &UserCreate) -> Result<User> {
    client.post(USERS_PATH, payload).await
}

pub async fn update(client: &ApiClient, user_id: Id, payload: &UserUpdate) -> Result<User> {
    client
        .patch(&super::detail_path(USERS_PATH, user_id), payload)
        .await
}

pub async fn delete(client: &ApiClient, user_id: Id) -> Result<()> {
    client.delete(&super::detail_path(USERS_PATH, user_id)).await
}
