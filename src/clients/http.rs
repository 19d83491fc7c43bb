use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

/// Minimal GET primitive used by every network-facing component.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the given timeout and user agent.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &crate::config::HttpConfig) -> anyhow::Result<Self> {
        Self::with_timeout(
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
        )
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

fn transport(url: &str, err: &reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.send(url)
            .await?
            .text()
            .await
            .map_err(|e| transport(url, &e))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .send(url)
            .await?
            .bytes()
            .await
            .map_err(|e| transport(url, &e))?;
        Ok(bytes.to_vec())
    }
}

/// Fetches `url` up to `attempts` times with a fixed `delay` between tries.
///
/// Every failed attempt is logged; the last error is wrapped in
/// [`FetchError::Exhausted`].
pub async fn fetch_with_retry(
    fetcher: &dyn Fetch,
    url: &str,
    attempts: u32,
    delay: Duration,
) -> Result<String, FetchError> {
    let attempts = attempts.max(1);
    let mut last = None;

    for attempt in 1..=attempts {
        match fetcher.get_text(url).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                warn!(
                    url = %url,
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Fetch attempt failed"
                );
                last = Some(e);
            }
        }

        if attempt < attempts && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Err(FetchError::Exhausted {
        url: url.to_string(),
        attempts,
        last: Box::new(last.unwrap_or_else(|| FetchError::Transport {
            url: url.to_string(),
            message: "no attempt made".to_string(),
        })),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Fetch for Flaky {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 503,
                })
            } else {
                Ok("ok".to_string())
            }
        }

        async fn get_bytes(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let fetcher = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        let body = fetch_with_retry(&fetcher, "http://x", 3, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(body, "ok");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let fetcher = Flaky {
            failures: 10,
            calls: AtomicU32::new(0),
        };
        let err = fetch_with_retry(&fetcher, "http://x", 3, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let fetcher = Flaky {
            failures: 0,
            calls: AtomicU32::new(0),
        };
        assert!(fetch_with_retry(&fetcher, "http://x", 0, Duration::ZERO).await.is_ok());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
