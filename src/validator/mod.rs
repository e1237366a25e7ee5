//! Async proxy validation: fan out validation requests across pending
//! and successful proxies with bounded concurrency, classify anonymity,
//! and persist verdicts.

pub mod anonymity;

use crate::config::ValidatorConfig;
use crate::database::ProxyStore;
use crate::error::Result;
use crate::models::{BatchVerdict, Proxy, Verdict};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

pub struct Validator {
    store: ProxyStore,
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(store: ProxyStore, config: ValidatorConfig) -> Self {
        Validator { store, config }
    }

    /// Validate a batch of pending proxies, bounded by
    /// `max_concurrent_validators`, and persist every verdict.
    #[instrument(skip(self, proxies))]
    pub async fn validate_batch(&self, proxies: Vec<Proxy>) -> Result<BatchVerdict> {
        let concurrency = self.config.max_concurrent_validators.max(1);
        let total = proxies.len();

        let results: Vec<Verdict> = stream::iter(proxies)
            .map(|proxy| async move { self.validate_one(&proxy).await })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        for verdict in &results {
            if let Err(e) = self.store.record_verdict(verdict).await {
                warn!(proxy_id = verdict.proxy_id, error = %e, "failed to persist verdict");
            }
        }

        let success = results.iter().filter(|v| v.success).count();
        Ok(BatchVerdict {
            total,
            success,
            failed: total - success,
            results,
        })
    }

    /// Validate a single proxy: build a dedicated client routed through
    /// it, hit the control URL, measure elapsed time, and classify
    /// anonymity from the echoed request metadata.
    async fn validate_one(&self, proxy: &Proxy) -> Verdict {
        let test_url = if proxy.country.as_deref() == Some("CN") {
            &self.config.test_url_cn
        } else {
            &self.config.test_url
        };

        let client = match self.build_client(proxy) {
            Ok(c) => c,
            Err(e) => {
                debug!(proxy_id = proxy.id, error = %e, "failed to build proxied client");
                return Verdict {
                    proxy_id: proxy.id,
                    success: false,
                    speed: None,
                    anonymity: None,
                };
            }
        };

        let started = Instant::now();
        let response = client.get(test_url.as_str()).send().await;

        match response {
            Ok(resp) if resp.status().is_success() || resp.status().as_u16() == 204 => {
                let speed = started.elapsed().as_secs_f64();
                let echoed_headers: HashMap<String, String> = resp
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
                    .collect();
                let body = resp.text().await.unwrap_or_default();

                let anonymity = Some(anonymity::classify_from_echo_body(&echoed_headers, &body, &proxy.ip));

                Verdict {
                    proxy_id: proxy.id,
                    success: true,
                    speed: Some(speed),
                    anonymity,
                }
            }
            Ok(resp) => {
                debug!(proxy_id = proxy.id, status = %resp.status(), "validation request rejected");
                Verdict {
                    proxy_id: proxy.id,
                    success: false,
                    speed: None,
                    anonymity: None,
                }
            }
            Err(e) => {
                debug!(proxy_id = proxy.id, error = %e, "validation request failed");
                Verdict {
                    proxy_id: proxy.id,
                    success: false,
                    speed: None,
                    anonymity: None,
                }
            }
        }
    }

    /// Build a `reqwest::Client` that routes all traffic through the
    /// given proxy. TLS verification is disabled and redirects are
    /// followed: the validator is measuring reachability and anonymity,
    /// not certificate hygiene, and many free proxies terminate TLS
    /// themselves.
    fn build_client(&self, proxy: &Proxy) -> Result<reqwest::Client> {
        let proxy_url = proxy.url();
        let reqwest_proxy = reqwest::Proxy::all(proxy_url.as_str())?;

        let client = reqwest::Client::builder()
            .proxy(reqwest_proxy)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(client)
    }
}

/// Shared handle used by the scheduler to trigger validation rounds from
/// multiple registered tasks without cloning the whole validator.
pub type SharedValidator = Arc<Validator>;
