// Authentication types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ApiError;
use crate::models::User;

/// Access/refresh token pair
///
/// `refresh` is optional because the refresh endpoint may keep the current
/// refresh token instead of rotating it.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: Some(refresh.into()),
        }
    }

    /// Extract a token pair from an (already unwrapped) refresh response body
    pub fn from_refresh_payload(payload: &Value) -> Result<Self, ApiError> {
        let access = payload
            .get("access")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::Auth("Refresh response has no access token".to_string()))?;

        let refresh = payload
            .get("refresh")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            access: access.to_string(),
            refresh,
        })
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &token_preview(&self.access))
            .field("refresh", &self.refresh.as_deref().map(token_preview))
            .finish()
    }
}

/// Short, log-safe prefix of a token
pub fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}...", prefix)
}

/// Username/password credentials for `auth/login/`
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

impl LoginResponse {
    pub fn tokens(&self) -> TokenPair {
        TokenPair::new(self.access.clone(), self.refresh.clone())
    }
}

/// Body of the refresh and logout calls
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_payload_with_rotation() {
        let pair =
            TokenPair::from_refresh_payload(&json!({"access": "new-access", "refresh": "new-refresh"}))
                .unwrap();
        assert_eq!(pair, TokenPair::new("new-access", "new-refresh"));
    }

    #[test]
    fn test_refresh_payload_without_rotation() {
        let pair = TokenPair::from_refresh_payload(&json!({"access": "new-access"})).unwrap();
        assert_eq!(pair.access, "new-access");
        assert_eq!(pair.refresh, None);
    }

    #[test]
    fn test_refresh_payload_missing_access() {
        let err = TokenPair::from_refresh_payload(&json!({"refresh": "r"})).unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));

        let err = TokenPair::from_refresh_payload(&json!({"access": ""})).unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));

        let err = TokenPair::from_refresh_payload(&Value::Null).unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let pair = TokenPair::new("abcdefghijklmnop", "qrstuvwxyz012345");
        let rendered = format!("{:?}", pair);
        assert!(rendered.contains("abcdefgh..."));
        assert!(!rendered.contains("ijklmnop"));

        let login = LoginRequest::new("admin", "hunter2");
        assert!(!format!("{:?}", login).contains("hunter2"));
    }

    #[test]
    fn test_token_preview_short_token() {
        assert_eq!(token_preview("abc"), "abc...");
    }
}
