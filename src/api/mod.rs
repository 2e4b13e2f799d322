//! HTTP client for the marketplace auth API. One `reqwest` client and one
//! base URL, resolved at startup; every call sends JSON and reads non-2xx
//! bodies for diagnostics. The [`AuthApi`] trait is the seam the session
//! manager and login flow depend on, so tests can substitute a double.

pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::{AuthResponse, UserProfile};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use tracing::{debug, info_span, Instrument};
use types::{LoginRequest, VerifyCodeRequest};
use url::Url;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Maximum number of error body characters surfaced to the caller.
const MAX_ERROR_CHARS: usize = 200;

/// Auth endpoints the client components consume.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    async fn verify_code(&self, email: &str, code: &str) -> Result<AuthResponse, ApiError>;
    async fn refresh(&self, token: &str) -> Result<AuthResponse, ApiError>;
    async fn logout(&self, token: &str) -> Result<(), ApiError>;
    async fn validate(&self, token: &str) -> Result<(), ApiError>;
}

/// Production client against the platform API.
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Builds the client for a base URL such as `http://localhost:8080`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the URL cannot be parsed, uses an
    /// unsupported scheme, or the underlying client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| ApiError::Config(format!("Error parsing URL: {err}")))?;

        let scheme = base_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ApiError::Config(format!(
                "Error parsing URL: unsupported scheme {scheme}"
            )));
        }

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|err| ApiError::Config(format!("Error building HTTP client: {err}")))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn json_body(response: Response) -> Result<AuthResponse, ApiError> {
        response
            .json::<AuthResponse>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    }

    /// Reads a failed response into `ApiError::Http`, preferring the
    /// server's `message` field over the raw body text.
    async fn non_success(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<AuthResponse>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| truncate_body(&text));

        debug!("request failed with status {status}: {message}");

        ApiError::Http { status, message }
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("/auth/login");

        let span = info_span!(
            "auth.login",
            http.method = "POST",
            url = %url
        );
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&LoginRequest { email, password })
            .send()
            .instrument(span)
            .await
            .map_err(ApiError::from)?;

        if !response.status().is_success() {
            return Err(Self::non_success(response).await);
        }

        Self::json_body(response).await
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("/auth/verify-code");

        let span = info_span!(
            "auth.verify_code",
            http.method = "POST",
            url = %url
        );
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&VerifyCodeRequest { email, code })
            .send()
            .instrument(span)
            .await
            .map_err(ApiError::from)?;

        if !response.status().is_success() {
            return Err(Self::non_success(response).await);
        }

        Self::json_body(response).await
    }

    async fn refresh(&self, token: &str) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("/auth/refresh");

        let span = info_span!(
            "auth.refresh",
            http.method = "POST",
            url = %url
        );
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(token)
            .send()
            .instrument(span)
            .await
            .map_err(ApiError::from)?;

        if !response.status().is_success() {
            return Err(Self::non_success(response).await);
        }

        Self::json_body(response).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let url = self.endpoint("/auth/logout");

        let span = info_span!(
            "auth.logout",
            http.method = "POST",
            url = %url
        );
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(token)
            .send()
            .instrument(span)
            .await
            .map_err(ApiError::from)?;

        if !response.status().is_success() {
            return Err(Self::non_success(response).await);
        }

        // body ignored
        Ok(())
    }

    async fn validate(&self, token: &str) -> Result<(), ApiError> {
        let url = self.endpoint("/auth/validate");

        let span = info_span!(
            "auth.validate",
            http.method = "GET",
            url = %url
        );
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(token)
            .send()
            .instrument(span)
            .await
            .map_err(ApiError::from)?;

        if !response.status().is_success() {
            return Err(Self::non_success(response).await);
        }

        Ok(())
    }
}

fn truncate_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_CHARS).collect()
}
