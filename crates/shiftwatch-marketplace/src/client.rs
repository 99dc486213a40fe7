//! Marketplace HTTP client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::types::OAuthResponse;
use crate::{Credentials, Job, MarketplaceError, TokenPair};

/// Default path of the offered-jobs listing.
pub const DEFAULT_OFFERED_PATH: &str = "/api/v2/workers/jobs/offered";

const LOGIN_PATH: &str = "/api/v2/users/login";
const REFRESH_PATH: &str = "/api/v2/users/refresh";
const REVOKE_PATH: &str = "/api/v2/oauth/revoke";

/// Operations the evaluation pipeline needs from the marketplace.
///
/// Every method performs exactly one request. Non-success responses come
/// back as [`MarketplaceError::Status`] so callers can react to a 401.
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Exchange account credentials for a token pair.
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, MarketplaceError>;

    /// Exchange a refresh token for a new token pair.
    async fn refresh(&self, tokens: &TokenPair) -> Result<TokenPair, MarketplaceError>;

    /// Revoke an access token.
    async fn revoke(&self, access_token: &str) -> Result<(), MarketplaceError>;

    /// List jobs with shifts currently offered to the account.
    async fn offered_jobs(&self, access_token: &str) -> Result<Vec<Job>, MarketplaceError>;
}

/// Client for the marketplace REST API.
pub struct MarketplaceClient {
    http: Client,
    base_url: String,
    offered_path: String,
}

impl MarketplaceClient {
    /// Create a new client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, MarketplaceError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            offered_path: DEFAULT_OFFERED_PATH.to_string(),
        })
    }

    /// Override the path of the offered-jobs listing.
    pub fn with_offered_path(mut self, path: impl Into<String>) -> Self {
        self.offered_path = path.into();
        self
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        endpoint: &'static str,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<reqwest::Response, MarketplaceError> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        Self::check_status(endpoint, response).await
    }

    /// Turn a non-success response into [`MarketplaceError::Status`].
    async fn check_status(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MarketplaceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.map_err(|e| {
            MarketplaceError::InvalidResponse(format!(
                "{} failed ({}): failed to read response: {}",
                endpoint, status, e
            ))
        })?;

        Err(MarketplaceError::Status {
            endpoint,
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, MarketplaceError> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Marketplace for MarketplaceClient {
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, MarketplaceError> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            email: &'a str,
            grant_type: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json(
                "login",
                LOGIN_PATH,
                None,
                &LoginRequest {
                    email: &credentials.email,
                    grant_type: "password",
                    password: &credentials.password,
                },
            )
            .await?;

        let body: OAuthResponse = Self::decode(response).await?;
        debug!("obtained token pair from login");
        Ok(body.oauth)
    }

    async fn refresh(&self, tokens: &TokenPair) -> Result<TokenPair, MarketplaceError> {
        #[derive(Serialize)]
        struct RefreshRequest<'a> {
            refresh_token: &'a str,
        }

        let response = self
            .post_json(
                "refresh",
                REFRESH_PATH,
                Some(&tokens.access_token),
                &RefreshRequest {
                    refresh_token: &tokens.refresh_token,
                },
            )
            .await?;

        let body: OAuthResponse = Self::decode(response).await?;
        debug!("obtained token pair from refresh");
        Ok(body.oauth)
    }

    async fn revoke(&self, access_token: &str) -> Result<(), MarketplaceError> {
        #[derive(Serialize)]
        struct RevokeRequest<'a> {
            token: &'a str,
        }

        self.post_json(
            "revoke",
            REVOKE_PATH,
            Some(access_token),
            &RevokeRequest {
                token: access_token,
            },
        )
        .await?;
        Ok(())
    }

    async fn offered_jobs(&self, access_token: &str) -> Result<Vec<Job>, MarketplaceError> {
        let response = self
            .http
            .get(self.url(&self.offered_path))
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = Self::check_status("offered jobs", response).await?;

        let jobs: Vec<Job> = Self::decode(response).await?;
        info!(count = jobs.len(), "jobs returned");
        Ok(jobs)
    }
}
