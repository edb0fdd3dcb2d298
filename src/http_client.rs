use anyhow::{Context, Result as AnyResult};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, Request, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::auth::{
    token_preview, RefreshCoordinator, RefreshRequest, RefreshTicket, TokenPair, TokenStore,
};
use crate::error::{ApiError, Result, TransportErrorKind};

/// Transport timeout applied to every call, the refresh call included
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const REQUEST_ID_HEADER: &str = "x-request-id";
const REFRESH_PATH: &str = "auth/refresh/";

/// Successful response with the envelope already removed
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// Deserialize the (unwrapped) body
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.body).map_err(ApiError::from)
    }
}

/// Unwrap the `{"status": "success", "data": ...}` envelope.
/// Bodies without the envelope pass through unchanged.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map)
            if map.get("status").and_then(Value::as_str) == Some("success")
                && map.contains_key("data") =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Authenticated client for the fleet API
///
/// Every resource call goes through [`ApiClient::send`], which:
/// - attaches the stored access token as a bearer credential
/// - unwraps the success envelope
/// - on a 401, refreshes the token once (shared by all concurrent callers)
///   and replays the request
pub struct ApiClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Versioned API root, always ending in `/`
    base_url: Url,

    tokens: Arc<dyn TokenStore>,

    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        coordinator: Arc<RefreshCoordinator>,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> AnyResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            tokens,
            coordinator,
        })
    }

    /// Client with the default 30 second timeouts
    pub fn with_defaults(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> AnyResult<Self> {
        Self::new(
            base_url,
            tokens,
            coordinator,
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_TIMEOUT_SECS,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Resolve a path relative to the API root
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("bad path '{}': {}", path, e)))
    }

    /// Start building a request against the API root
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.request(method, self.url(path)?))
    }

    /// Send a request with bearer authentication and transparent 401 recovery
    pub async fn send(&self, mut request: Request) -> Result<ApiResponse> {
        self.authorize(&mut request);
        let mut retried = false;

        loop {
            // A request whose body cannot be cloned has no replayable context
            let replay = request.try_clone();
            let sent_with = bearer_of(&request);

            let err = match self.execute(request).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            let Some(mut original) = replay else {
                return Err(err);
            };

            if !err.is_unauthorized() || retried {
                if err.is_forbidden() {
                    tracing::debug!(url = %original.url(), "Forbidden; leaving it to the caller");
                }
                return Err(err);
            }

            let token = self.recover_access_token(err, sent_with.as_deref()).await?;
            set_bearer(&mut original, &token);
            request = original;
            retried = true;
        }
    }

    /// Send with bearer authentication but without 401 recovery
    pub async fn send_once(&self, mut request: Request) -> Result<ApiResponse> {
        self.authorize(&mut request);
        self.execute(request).await
    }

    /// [`ApiClient::send`] that gives up as soon as `cancel` fires
    pub async fn send_cancellable(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.send(request) => result,
        }
    }

    /// Exchange a refresh token for a new pair. Bypasses the interceptors.
    pub async fn refresh_tokens(&self, refresh: &str) -> Result<TokenPair> {
        let request = self
            .client
            .post(self.url(REFRESH_PATH)?)
            .json(&RefreshRequest { refresh })
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let response = self.execute(request).await?;
        TokenPair::from_refresh_payload(&response.body)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = build(self.request(Method::GET, path)?)?;
        self.send(request).await?.json()
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = build(self.request(Method::GET, path)?.query(query))?;
        self.send(request).await?.json()
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = build(self.request(Method::POST, path)?.json(body))?;
        self.send(request).await?.json()
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = build(self.request(Method::PATCH, path)?.json(body))?;
        self.send(request).await?.json()
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = build(self.request(Method::DELETE, path)?)?;
        self.send(request).await.map(|_| ())
    }

    /// Request interceptor: attach the stored access token, if any
    fn authorize(&self, request: &mut Request) {
        if let Some(token) = self.tokens.access() {
            set_bearer(request, &token);
        }
    }

    /// Get a usable access token after a 401, refreshing at most once per burst
    async fn recover_access_token(
        &self,
        original: ApiError,
        sent_with: Option<&str>,
    ) -> Result<String> {
        if self.tokens.refresh().is_none() {
            tracing::warn!("Received 401 without a refresh token; clearing session");
            self.tokens.clear();
            return Err(original);
        }

        if let Some(current) = self.rotated_access_token(sent_with) {
            tracing::debug!("Access token already refreshed; replaying with stored token");
            return Ok(current);
        }

        let lease = match self.coordinator.begin() {
            RefreshTicket::Queued(pending) => return pending.wait().await,
            RefreshTicket::Leader(lease) => lease,
        };

        // A previous leader may have settled between the check above and begin()
        if let Some(current) = self.rotated_access_token(sent_with) {
            tracing::debug!("Refresh finished before this one started; reusing its token");
            lease.settle(Ok(current.clone()));
            return Ok(current);
        }
        let Some(refresh) = self.tokens.refresh() else {
            tracing::warn!("Refresh token disappeared before refresh; clearing session");
            self.tokens.clear();
            lease.settle(Err(original.clone()));
            return Err(original);
        };

        tracing::info!("Access token rejected, refreshing...");
        match self.refresh_tokens(&refresh).await {
            Ok(pair) => {
                self.tokens.set(&pair);
                tracing::info!(
                    access = %token_preview(&pair.access),
                    rotated = pair.refresh.is_some(),
                    "Token refreshed"
                );
                lease.settle(Ok(pair.access.clone()));
                Ok(pair.access)
            }
            Err(refresh_err) => {
                tracing::warn!(error = %refresh_err, "Token refresh failed; clearing session");
                // Clear before settling; settle drops the in-progress flag
                self.tokens.clear();
                lease.settle(Err(refresh_err));
                Err(original)
            }
        }
    }

    /// Stored access token, if it is not the one the failed request carried
    fn rotated_access_token(&self, sent_with: Option<&str>) -> Option<String> {
        self.tokens
            .access()
            .filter(|current| sent_with != Some(current.as_str()))
    }

    /// Execute a single attempt: transport, status check, envelope unwrap
    async fn execute(&self, mut request: Request) -> Result<ApiResponse> {
        let request_id = stamp_request_id(&mut request);
        let method = request.method().clone();
        let url = request.url().clone();

        tracing::debug!(
            method = %method,
            url = %url,
            request_id = %request_id,
            "Sending HTTP request"
        );

        let response = self.client.execute(request).await.map_err(|e| {
            let kind = TransportErrorKind::of(&e);
            tracing::warn!(
                error_kind = %kind,
                error = %e,
                url = %url,
                request_id = %request_id,
                "HTTP request error"
            );
            ApiError::Transport {
                kind,
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::from)?;

        if !status.is_success() {
            let err = ApiError::from_response(status, &text);
            if status == StatusCode::UNAUTHORIZED {
                tracing::debug!(url = %url, request_id = %request_id, "Received 401");
            } else {
                tracing::warn!(
                    status = status.as_u16(),
                    url = %url,
                    request_id = %request_id,
                    error = %err,
                    "HTTP request failed with error response"
                );
            }
            return Err(err);
        }

        tracing::debug!(status = %status, request_id = %request_id, "Request successful");

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiResponse {
            status,
            body: unwrap_envelope(body),
        })
    }
}

fn parse_base_url(base_url: &str) -> AnyResult<Url> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };
    Url::parse(&normalized).with_context(|| format!("Invalid API base URL: {}", base_url))
}

fn build(builder: RequestBuilder) -> Result<Request> {
    builder
        .build()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn set_bearer(request: &mut Request, token: &str) {
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(value) => {
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(_) => tracing::warn!("Stored access token is not a valid header value; sending without it"),
    }
}

fn bearer_of(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn stamp_request_id(request: &mut Request) -> String {
    if let Some(existing) = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return existing.to_string();
    }

    let id = uuid::Uuid::new_v4().to_string()[..8].to_string();
    if let Ok(value) = HeaderValue::from_str(&id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use serde_json::json;

    fn test_client(tokens: Arc<dyn TokenStore>) -> ApiClient {
        ApiClient::with_defaults(
            "http://127.0.0.1:8000/api/v1",
            tokens,
            Arc::new(RefreshCoordinator::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_unwrap_envelope() {
        let wrapped = json!({"status": "success", "data": {"id": 1}});
        assert_eq!(unwrap_envelope(wrapped), json!({"id": 1}));

        let plain = json!({"id": 1});
        assert_eq!(unwrap_envelope(plain.clone()), plain);
    }

    #[test]
    fn test_unwrap_envelope_edge_cases() {
        // Error envelopes and success without data are left alone
        let error = json!({"status": "error", "message": "nope"});
        assert_eq!(unwrap_envelope(error.clone()), error);

        let no_data = json!({"status": "success"});
        assert_eq!(unwrap_envelope(no_data.clone()), no_data);

        assert_eq!(
            unwrap_envelope(json!({"status": "success", "data": null})),
            Value::Null
        );
        assert_eq!(
            unwrap_envelope(json!({"status": "success", "data": [1, 2]})),
            json!([1, 2])
        );
        assert_eq!(unwrap_envelope(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_base_url_normalization() {
        let client = test_client(Arc::new(MemoryTokenStore::new()));
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/api/v1/");
        assert_eq!(
            client.url("auth/me/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/v1/auth/me/"
        );
        assert_eq!(
            client.url("/cars/12/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/v1/cars/12/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ApiClient::with_defaults(
            "not a url",
            Arc::new(MemoryTokenStore::new()),
            Arc::new(RefreshCoordinator::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_authorize_attaches_bearer() {
        let tokens: Arc<dyn TokenStore> =
            Arc::new(MemoryTokenStore::with_tokens(&TokenPair::new("abc", "def")));
        let client = test_client(tokens);
        let mut request = build(client.request(Method::GET, "cars/").unwrap()).unwrap();

        client.authorize(&mut request);
        assert_eq!(bearer_of(&request).as_deref(), Some("abc"));
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer abc");
    }

    #[test]
    fn test_authorize_without_token() {
        let client = test_client(Arc::new(MemoryTokenStore::new()));
        let mut request = build(client.request(Method::GET, "cars/").unwrap()).unwrap();

        client.authorize(&mut request);
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(bearer_of(&request), None);
    }

    #[test]
    fn test_request_id_is_stable() {
        let client = test_client(Arc::new(MemoryTokenStore::new()));
        let mut request = build(client.request(Method::GET, "cars/").unwrap()).unwrap();

        let first = stamp_request_id(&mut request);
        let second = stamp_request_id(&mut request);
        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
    }

    #[test]
    fn test_api_response_json() {
        let response = ApiResponse {
            status: StatusCode::OK,
            body: json!({"count": 0, "results": []}),
        };
        let page: crate::models::Page<crate::models::Fuel> = response.json().unwrap();
        assert!(page.is_empty());

        let response = ApiResponse {
            status: StatusCode::OK,
            body: json!("oops"),
        };
        let err = response.json::<crate::models::User>().unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
