//! Reachability probes.

use std::future::Future;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::config::CartConfig;

/// Checks whether the backend can be reached right now.
pub trait Probe: Send + Sync + 'static {
    /// Returns `true` if the backend answered.
    fn check(&self) -> impl Future<Output = bool> + Send;
}

/// Probes the backend with a plain GET on its base URL.
///
/// Any HTTP response counts as reachable, including error statuses. Each
/// check opens a fresh connection.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    http: reqwest::Client,
    url: Url,
}

impl HttpProbe {
    /// Create a probe for `url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { http, url })
    }

    /// Create a probe for the configured backend, bounded by its connect
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &CartConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.base_url.clone(), config.connect_timeout)
    }
}

impl Probe for HttpProbe {
    async fn check(&self) -> bool {
        match self.http.get(self.url.clone()).send().await {
            Ok(response) => {
                debug!(status = %response.status(), "Reachability probe answered");
                true
            }
            Err(e) => {
                debug!(error = %e, "Reachability probe failed");
                false
            }
        }
    }
}
