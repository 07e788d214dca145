//! Endpoint probing and concurrent fan-out

use std::time::{Duration, Instant};

use chrono::Utc;
use futures::StreamExt as _;
use log::{debug, error, info};

use crate::certificate::CertificateInspector;
use crate::record::{DomainStatus, ProbeResult};

/// Width of the probe worker pool, constant regardless of batch size
const WORKER_POOL: usize = 20;

/// Per-attempt network timeout; slow hosts are classified FAILED rather than
/// allowed to stall a worker
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Timestamp format of `last_chk`
const CHECKED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Probes domains for liveness and certificate expiry
#[derive(Debug)]
pub struct Checker {
    client: reqwest::Client,
    inspector: CertificateInspector,
}

impl Default for Checker {
    fn default() -> Checker {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .expect("HTTP client");
        Checker {
            client,
            inspector: CertificateInspector::default(),
        }
    }
}

impl Checker {
    /// Probe one domain: scheme resolution, bounded-timeout GET
    /// classification and, for a secured success, certificate inspection
    ///
    /// ```no_run
    /// # use dms::Checker;
    /// # #[tokio::main]
    /// # async fn main() {
    /// let checker = Checker::default();
    /// checker.check_one("example.com").await;
    /// # }
    /// ```
    pub async fn check_one(&self, domain: &str) -> ProbeResult {
        let mut result = ProbeResult::new(domain);

        let (response, secured) = self.request(domain).await;
        match response {
            Some(response) if response.status() == reqwest::StatusCode::OK => {
                result.status = DomainStatus::Ok;
                if secured {
                    let inspector = self.inspector.clone();
                    let url = domain.to_string();
                    // inspection is blocking socket I/O, keep it off the runtime
                    let (issuer, expiration) =
                        tokio::task::spawn_blocking(move || inspector.inspect(&url))
                            .await
                            .unwrap_or_else(|e| {
                                (
                                    "Error".to_string(),
                                    format!("Failed to check certificate: {e}"),
                                )
                            });
                    result.ssl_issuer = issuer;
                    result.ssl_expiration = expiration;
                }
            }
            Some(_) => result.status = DomainStatus::Failed,
            None => {
                result.status = DomainStatus::Failed;
                error!("domain {domain} check failed");
            }
        }

        result.last_chk = Utc::now().format(CHECKED_AT_FORMAT).to_string();
        result
    }

    /// Probe every domain through the fixed-size worker pool, returning
    /// results in completion order
    ///
    /// Callers must correlate results to registry entries by the `domain`
    /// field, never by position. Duplicate inputs each produce a result.
    ///
    /// ```no_run
    /// # use dms::Checker;
    /// # #[tokio::main]
    /// # async fn main() {
    /// let checker = Checker::default();
    /// checker.check_all(&["example.com", "example.org"]).await;
    /// # }
    /// ```
    pub async fn check_all<T>(&self, domains: &[T]) -> Vec<ProbeResult>
    where
        T: AsRef<str>,
    {
        let start = Instant::now();
        info!("starting liveness check of {} domain(s)", domains.len());
        let results = futures::stream::iter(
            domains
                .iter()
                .map(|domain| self.check_one(domain.as_ref())),
        )
        .buffer_unordered(WORKER_POOL)
        .collect::<Vec<_>>()
        .await;
        info!(
            "liveness check complete in {}ms",
            start.elapsed().as_millis()
        );
        results
    }

    /// GET the domain, trying `https://` before `http://` when no scheme is
    /// given; returns the response of the attempt that got one, and whether
    /// that attempt was secured
    async fn request(&self, domain: &str) -> (Option<reqwest::Response>, bool) {
        if domain.starts_with("http://") || domain.starts_with("https://") {
            let secured = domain.starts_with("https://");
            return (self.client.get(domain).send().await.ok(), secured);
        }

        match self.client.get(format!("https://{domain}")).send().await {
            Ok(response) => (Some(response), true),
            Err(e) => {
                debug!("https attempt on {domain} failed: {e}, falling back to http");
                let response = self.client.get(format!("http://{domain}")).send().await.ok();
                (response, false)
            }
        }
    }
}
