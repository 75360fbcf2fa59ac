//! Connectivity probes used for the online/offline status flag

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::config::CoreConfig;
use crate::error::{Error, Result};

/// Boxed future returned by [`ConnectivityProbe::is_online`]
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Best-effort reachability check.
///
/// Implementations must resolve to `false` on any failure instead of
/// erroring or hanging.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> ProbeFuture<'_>;
}

/// Single HTTP `HEAD` request with a short timeout
#[derive(Clone)]
pub struct HttpProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                Error::InvalidInput(format!("failed to build connectivity HTTP client: {error}"))
            })?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        Self::new(config.connectivity_url.clone(), config.connectivity_timeout())
    }
}

impl std::fmt::Debug for HttpProbe {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpProbe")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl ConnectivityProbe for HttpProbe {
    fn is_online(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            match self.client.head(&self.url).send().await {
                // Any HTTP answer means the network path works
                Ok(response) => {
                    tracing::debug!("Connectivity probe answered {}", response.status());
                    true
                }
                Err(error) => {
                    tracing::debug!("Connectivity probe failed: {error}");
                    false
                }
            }
        })
    }
}

/// Probe with a fixed answer, for hosts without network access and tests
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl ConnectivityProbe for StaticProbe {
    fn is_online(&self) -> ProbeFuture<'_> {
        let online = self.0;
        Box::pin(async move { online })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_probe_reports_fixed_value() {
        assert!(StaticProbe(true).is_online().await);
        assert!(!StaticProbe(false).is_online().await);
    }

    #[tokio::test]
    async fn unreachable_host_reports_offline() {
        // Nothing listens on the local discard port
        let probe = HttpProbe::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(!probe.is_online().await);
    }
}
