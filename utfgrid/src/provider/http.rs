//! HTTP client abstraction for testability

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::types::{BoxFuture, ProviderError};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for cancellable async HTTP GET requests.
///
/// Implementations must stop waiting on the network as soon as the token
/// is cancelled and return [`ProviderError::Cancelled`], so a response for
/// an abandoned tile never reaches the cache.
pub trait AsyncHttpClient: Send + Sync + 'static {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `cancellation` - Token that aborts the request when cancelled
    fn get<'a>(
        &'a self,
        url: &'a str,
        cancellation: CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError::HttpError(format!("Failed to read response: {}", e)))
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    fn get<'a>(
        &'a self,
        url: &'a str,
        cancellation: CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(ProviderError::Cancelled),
                result = self.fetch(url) => result,
            }
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Mock HTTP client returning a fixed response.
    pub struct MockAsyncHttpClient {
        pub response: Result<Vec<u8>, ProviderError>,
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        fn get<'a>(
            &'a self,
            _url: &'a str,
            cancellation: CancellationToken,
        ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
            Box::pin(async move {
                if cancellation.is_cancelled() {
                    return Err(ProviderError::Cancelled);
                }
                self.response.clone()
            })
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockAsyncHttpClient {
            response: Ok(vec![1, 2, 3, 4]),
        };

        let result = mock.get("http://example.com", CancellationToken::new()).await;
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_mock_client_cancelled() {
        let mock = MockAsyncHttpClient {
            response: Ok(vec![1]),
        };
        let token = CancellationToken::new();
        token.cancel();

        let result = mock.get("http://example.com", token).await;
        assert_eq!(result, Err(ProviderError::Cancelled));
    }

    #[tokio::test]
    async fn test_reqwest_client_honours_cancellation() {
        let client = AsyncReqwestClient::with_timeout(5).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        // Biased select observes the cancelled token before any I/O happens.
        let result = client.get("http://127.0.0.1:9/never", token).await;
        assert_eq!(result, Err(ProviderError::Cancelled));
    }
}
