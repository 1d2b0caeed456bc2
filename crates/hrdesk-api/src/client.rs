//! Thin HTTP client over the HRDesk backend.
//!
//! Every non-success response is classified into an [`ErrorKind`] from the
//! status code and error body, so callers branch on `err.kind` instead of
//! re-inspecting HTTP details. Transport failures map to
//! [`ErrorKind::Network`] via the `From<reqwest::Error>` conversion.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use hrdesk_core::config::ApiConfig;
use hrdesk_core::{AppError, AppResult, ErrorKind};

use crate::protocol::{ApiErrorBody, LoginRequest, LoginResponse, RefreshResponse};

/// Path of the credential-issuing endpoint.
pub const LOGIN_PATH: &str = "/login";
/// Path of the best-effort server-side invalidation endpoint.
pub const LOGOUT_PATH: &str = "/logout";
/// Path of the access-token renewal endpoint (refresh token as bearer).
pub const REFRESH_PATH: &str = "/token/refresh";
/// Path of the lightweight session heartbeat target.
pub const VALIDATE_PATH: &str = "/session/validate";

/// HTTP client for the HRDesk backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from the API configuration.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /login`. Succeeds with the issued credential bundle; a 409
    /// with the already-logged-in flag classifies as [`ErrorKind::Conflict`].
    pub async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse> {
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(request)
            .send()
            .await?;
        read_json(LOGIN_PATH, response).await
    }

    /// `POST /logout` with the access token as bearer.
    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .http
            .post(self.url(LOGOUT_PATH))
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(LOGOUT_PATH, response).await
    }

    /// `POST /token/refresh` with the refresh token as bearer. The returned
    /// access token carries the new expiry in its claims.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .bearer_auth(refresh_token)
            .send()
            .await?;
        read_json(REFRESH_PATH, response).await
    }

    /// Generic authenticated GET returning the raw JSON payload.
    pub async fn get(&self, path: &str, bearer: Option<&str>) -> AppResult<serde_json::Value> {
        let mut request = self.http.get(self.url(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        read_json(path, response).await
    }

    /// Generic authenticated POST returning the raw JSON payload.
    pub async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
        bearer: Option<&str>,
    ) -> AppResult<serde_json::Value> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        read_json(path, response).await
    }
}

/// Parse a successful response as JSON, or classify the failure.
async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json::<T>().await?)
    } else {
        Err(classify_failure(path, status, response).await)
    }
}

/// Discard a successful response body, or classify the failure.
async fn ensure_success(path: &str, response: Response) -> AppResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(classify_failure(path, status, response).await)
    }
}

async fn classify_failure(path: &str, status: StatusCode, response: Response) -> AppError {
    // An unparseable or absent body degrades to the status code alone.
    let body = response
        .json::<ApiErrorBody>()
        .await
        .unwrap_or_default();
    debug!(path, status = status.as_u16(), revoked = body.revoked, "request failed");
    classify(path, status, &body)
}

/// Map a non-success status and error body to the error taxonomy.
///
/// A plain 401 normally means the access token expired; on the login
/// endpoint itself it means the credentials were rejected, which is not a
/// token lifecycle condition.
fn classify(path: &str, status: StatusCode, body: &ApiErrorBody) -> AppError {
    let detail = body.detail();
    match status {
        StatusCode::UNAUTHORIZED if body.revoked => AppError::revoked(detail),
        StatusCode::UNAUTHORIZED if path == LOGIN_PATH => AppError::session(detail),
        StatusCode::UNAUTHORIZED => AppError::expired(detail),
        StatusCode::FORBIDDEN => AppError::forbidden(detail),
        StatusCode::CONFLICT => AppError::conflict(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::validation(detail),
        StatusCode::TOO_MANY_REQUESTS => AppError::rate_limited(detail),
        s if s.is_server_error() => AppError::server(detail),
        s => AppError::new(
            ErrorKind::Internal,
            format!("Unexpected status {s}: {detail}"),
        ),
    }
}
