//! HTTP client for the swapbook backend API.
//!
//! Every endpoint is a read-only GET returning JSON. Requests are
//! independent of each other; callers may have several in flight
//! concurrently with no ordering guarantee between them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{
    error::ApiError,
    types::{AddressReport, ChainflipSwap, Order, ThorchainSwap},
};

/// Env var overriding the backend base URL.
pub const API_URL_ENV: &str = "SWAPBOOK_API_URL";

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for an [`ApiClient`].
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Base URL from `SWAPBOOK_API_URL` (default: localhost backend).
    pub fn from_env() -> Result<Self, ApiError> {
        let raw = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Ok(Self::new(Url::parse(&raw)?))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Typed client over the backend's five endpoints.
///
/// Cheap to clone; the underlying [`reqwest::Client`] is shared.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Matched orders created inside `[from, to]`, both inclusive.
    /// The window travels as epoch milliseconds.
    pub async fn orders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, ApiError> {
        debug!(%from, %to, "fetching order window");
        let url = self.base_url.join("orders")?;
        let response = self
            .http
            .get(url)
            .query(&[
                ("from", from.timestamp_millis()),
                ("to", to.timestamp_millis()),
            ])
            .send()
            .await?;

        decode(response).await
    }

    /// Tags and orders for a single originating address.
    pub async fn search(&self, address: &str) -> Result<AddressReport, ApiError> {
        debug!(address, "searching address");
        let url = self.base_url.join("search")?;
        let response = self
            .http
            .get(url)
            .query(&[("address", address)])
            .send()
            .await?;

        decode(response).await
    }

    /// Associate `tag` with `address` server-side. The response body is
    /// an acknowledgement only.
    pub async fn add_tag(&self, address: &str, tag: &str) -> Result<(), ApiError> {
        debug!(address, tag, "adding tag");
        let url = self.base_url.join("tag")?;
        let response = self
            .http
            .get(url)
            .query(&[("address", address), ("tag", tag)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(())
    }

    pub async fn thorchain(&self) -> Result<Vec<ThorchainSwap>, ApiError> {
        debug!("fetching thorchain swaps");
        let url = self.base_url.join("thorchain")?;
        let response = self.http.get(url).send().await?;

        decode(response).await
    }

    pub async fn chainflip(&self) -> Result<Vec<ChainflipSwap>, ApiError> {
        debug!("fetching chainflip swaps");
        let url = self.base_url.join("chainflip")?;
        let response = self.http.get(url).send().await?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status(status));
    }
    Ok(response.json::<T>().await?)
}
