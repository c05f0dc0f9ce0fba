use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    /// Timeout, DNS or connection failure.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Status and body as the wire returned them, before any status policy.
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// A successfully fetched (2xx) document.
#[derive(Debug, Clone)]
pub struct Page {
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        let transport_err = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_err)?;
        Ok(RawResponse { status, body })
    }
}

/// Rate-limited GET shared by every flow.
///
/// After each successful fetch the next call waits until `delay` has
/// elapsed. The lock is held across the request, so at most one fetch is
/// in flight. Failed fetches do not arm the delay. No retries.
pub struct Fetcher<T> {
    transport: T,
    delay_ms: AtomicU64,
    ready_at: Mutex<Option<Instant>>,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, delay: Duration) -> Self {
        Self {
            transport,
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
            ready_at: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.load(Ordering::Relaxed))
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    pub async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let mut ready_at = self.ready_at.lock().await;
        if let Some(at) = *ready_at {
            tokio::time::sleep_until(at).await;
        }

        debug!("GET {}", url);
        let raw = self.transport.get(url).await?;

        match raw.status {
            200..=299 => {}
            404 => {
                return Err(FetchError::NotFound {
                    url: url.to_string(),
                })
            }
            status => {
                return Err(FetchError::Http {
                    url: url.to_string(),
                    status,
                })
            }
        }

        *ready_at = Some(Instant::now() + self.delay());
        Ok(Page { body: raw.body })
    }
}
