//! REST API client for the Alpaca trading API

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::auth::apply_to_request;
use super::messages::*;
use crate::common::errors::{ClientError, Result};
use crate::common::types::OrderRequest;
use crate::config::types::ApiCredentials;

/// REST API client for Alpaca
#[derive(Debug, Clone)]
pub struct AlpacaRestClient {
    /// HTTP client
    client: Client,
    /// Base URL of the trading API
    base_url: String,
    /// API credentials
    credentials: ApiCredentials,
}

impl AlpacaRestClient {
    /// Create a new REST client
    pub fn new(base_url: &str, credentials: ApiCredentials) -> Result<Self> {
        Self::with_timeout(base_url, credentials, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, credentials: ApiCredentials, timeout: Duration) -> Result<Self> {
        Url::parse(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        apply_to_request(&self.credentials, self.client.get(self.url(path)))
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        apply_to_request(&self.credentials, self.client.delete(self.url(path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        apply_to_request(&self.credentials, self.client.post(self.url(path)))
    }

    /// Turn a non-success response into `ClientError::Api`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    // ========================================================================
    // Account & Positions
    // ========================================================================

    /// Get the trading account
    #[instrument(skip(self))]
    pub async fn get_account(&self) -> Result<AccountResponse> {
        let response = Self::check(self.get("/v2/account").send().await?).await?;
        Ok(response.json().await?)
    }

    /// Get the open position for a symbol
    ///
    /// A 404 means the account holds no position and maps to
    /// `ClientError::PositionNotFound`.
    #[instrument(skip(self))]
    pub async fn get_position(&self, symbol: &str) -> Result<PositionResponse> {
        let response = self.get(&format!("/v2/positions/{}", symbol)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::PositionNotFound(symbol.to_string()));
        }
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// List open orders, newest first
    #[instrument(skip(self))]
    pub async fn list_open_orders(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<OrderResponse>> {
        let mut query = vec![
            ("status", "open".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(symbol) = symbol {
            query.push(("symbols", symbol.to_string()));
        }
        debug!(?query, "Listing open orders");

        let response = Self::check(self.get("/v2/orders").query(&query).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Cancel every open order
    #[instrument(skip(self))]
    pub async fn cancel_all_orders(&self) -> Result<()> {
        Self::check(self.delete("/v2/orders").send().await?).await?;
        Ok(())
    }

    /// Cancel one order
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &str) -> Result<()> {
        Self::check(self.delete(&format!("/v2/orders/{}", order_id)).send().await?).await?;
        Ok(())
    }

    /// Submit an order
    #[instrument(skip(self))]
    pub async fn place_order(&self, request: &OrderRequest) -> Result<OrderResponse> {
        let body = PlaceOrderBody::from(request);
        debug!(?body, "Submitting order");

        let response = Self::check(self.post("/v2/orders").json(&body).send().await?).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> ApiCredentials {
        ApiCredentials::new("key".to_string(), "secret".to_string())
    }

    #[test]
    fn test_client_creation() {
        let client = AlpacaRestClient::new("https://paper-api.alpaca.markets", creds());
        assert!(client.is_ok());
    }

    #[test]
    fn test_url_normalization() {
        let client = AlpacaRestClient::new("https://paper-api.alpaca.markets/", creds()).unwrap();
        assert!(!client.base_url.ends_with('/'));
        assert_eq!(client.url("/v2/account"), "https://paper-api.alpaca.markets/v2/account");
    }

    #[test]
    fn test_invalid_base_url() {
        let client = AlpacaRestClient::new("not a url", creds());
        assert!(matches!(client, Err(ClientError::Configuration(_))));
    }
}
