// Authentication endpoints

use reqwest::Method;

use crate::auth::{LoginRequest, LoginResponse, RefreshRequest};
use crate::error::{ApiError, Result};
use crate::http_client::ApiClient;
use crate::models::{MeUpdate, User};

pub const LOGIN_PATH: &str = "auth/login/";
pub const LOGOUT_PATH: &str = "auth/logout/";
pub const ME_PATH: &str = "auth/me/";

/// Exchange credentials for a token pair and the embedded user
pub async fn login(client: &ApiClient, credentials: &LoginRequest) -> Result<LoginResponse> {
    let request = client
        .request(Method::POST, LOGIN_PATH)?
        .json(credentials)
        .build()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    // A 401 here means bad credentials, not an expired session
    client.send_once(request).await?.json()
}

/// Invalidate the refresh token server-side. Requires a valid access token,
/// so it goes through the 401 refresh protocol like any other call.
pub async fn logout(client: &ApiClient, refresh: &str) -> Result<()> {
    let request = client
        .request(Method::POST, LOGOUT_PATH)?
        .json(&RefreshRequest { refresh })
        .build()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    client.send(request).await.map(|_| ())
}

/// Current user profile
pub async fn me(client: &ApiClient) -> Result<User> {
    client.get(ME_PATH).await
}

/// Update the current user's own profile
pub async fn update_me(client: &ApiClient, update: &MeUpdate) -> Result<User> {
    client.patch(ME_PATH, update).await
}
