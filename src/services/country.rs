//! Best-effort IP-to-country resolution for proxies missing a country
//! label. A failed lookup just leaves the proxy unlabeled for the next
//! round; it never fails the calling task.

use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const BATCH_ENDPOINT: &str = "http://ip-api.com/batch?fields=status,countryCode,query";
const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct BatchEntry {
    status: String,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    query: String,
}

pub struct CountryResolver {
    client: reqwest::Client,
}

impl Default for CountryResolver {
    fn default() -> Self {
        CountryResolver {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("static reqwest client config is valid"),
        }
    }
}

impl CountryResolver {
    /// Resolve countries for `(proxy_id, ip)` pairs, returning only the
    /// pairs that resolved successfully. Requests are chunked to the
    /// provider's batch size limit.
    pub async fn resolve(&self, targets: &[(i64, String)]) -> Vec<(i64, String)> {
        let mut resolved = Vec::new();

        for chunk in targets.chunks(MAX_BATCH_SIZE) {
            let ips: Vec<&str> = chunk.iter().map(|(_, ip)| ip.as_str()).collect();
            match self.resolve_chunk(&ips).await {
                Ok(entries) => {
                    for (id, ip) in chunk {
                        if let Some(entry) = entries.iter().find(|e| &e.query == ip) {
                            if entry.status == "success" {
                                if let Some(code) = &entry.country_code {
                                    resolved.push((*id, code.clone()));
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, batch_size = chunk.len(), "country lookup batch failed");
                }
            }
        }

        resolved
    }

    async fn resolve_chunk(&self, ips: &[&str]) -> reqwest::Result<Vec<BatchEntry>> {
        self.client
            .post(BATCH_ENDPOINT)
            .json(ips)
            .send()
            .await?
            .json()
            .await
    }
}
