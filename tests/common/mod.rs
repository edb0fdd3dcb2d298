// Shared helpers for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use parko_client::auth::{MemoryTokenStore, RefreshCoordinator, TokenPair, TokenStore};
use parko_client::http_client::ApiClient;

pub const API_PREFIX: &str = "/api/v1";

pub struct TestClient {
    pub api: Arc<ApiClient>,
    pub tokens: Arc<dyn TokenStore>,
    pub coordinator: Arc<RefreshCoordinator>,
}

/// Client against a mock server, optionally seeded with a token pair
pub fn client_for(server: &mockito::ServerGuard, tokens: Option<TokenPair>) -> TestClient {
    let store: Arc<dyn TokenStore> = match tokens {
        Some(ref pair) => Arc::new(MemoryTokenStore::with_tokens(pair)),
        None => Arc::new(MemoryTokenStore::new()),
    };
    let coordinator = Arc::new(RefreshCoordinator::new());
    let api = ApiClient::with_defaults(
        &format!("{}{}/", server.url(), API_PREFIX),
        store.clone(),
        coordinator.clone(),
    )
    .expect("Failed to create API client");

    TestClient {
        api: Arc::new(api),
        tokens: store,
        coordinator,
    }
}

pub fn path(suffix: &str) -> String {
    format!("{}/{}", API_PREFIX, suffix)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Wrap a payload in the backend success envelope
pub fn envelope(data: Value) -> String {
    json!({"status": "success", "data": data}).to_string()
}

pub fn unauthorized_body() -> String {
    json!({
        "status": "error",
        "message": "Given token not valid for any token type",
        "errors": {"code": "token_not_valid"}
    })
    .to_string()
}

pub fn user_json(id: i64, username: &str, first_name: &str, role: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "first_name": first_name,
        "last_name": "",
        "email": format!("{}@example.com", username),
        "role": role,
        "region": "unknown",
        "language": "ru",
        "company": 1,
        "company_name": "Demo Fleet",
        "is_active": true
    })
}

/// Poll until `condition` holds or two seconds pass
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
