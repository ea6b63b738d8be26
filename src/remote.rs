// 🌐 Remote source - fetch the coin list from the API endpoint

use crate::coin::{decode_coins, Coin};
use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Default mock endpoint serving the coin payload.
pub const DEFAULT_ENDPOINT: &str = "https://37656be98b8f42ae8348e4da3ee3193f.api.mockbin.io/";

/// One fetch, one result. No retry, no cancellation.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self) -> FetchResult<Vec<Coin>>;
}

pub struct HttpRemoteSource {
    client: Client,
    endpoint: String,
}

impl HttpRemoteSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch(&self) -> FetchResult<Vec<Coin>> {
        info!(url = %self.endpoint, "Fetching coin list");

        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        let coins = decode_coins(&body)?;
        debug!(count = coins.len(), "Fetched coins");

        Ok(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_source_keeps_endpoint() {
        let source = HttpRemoteSource::new(DEFAULT_ENDPOINT, Duration::from_secs(5)).unwrap();
        assert_eq!(source.endpoint(), DEFAULT_ENDPOINT);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        // Port 9 on loopback: nothing listens there
        let source =
            HttpRemoteSource::new("http://127.0.0.1:9/coins", Duration::from_millis(500)).unwrap();

        let result = source.fetch().await;

        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
