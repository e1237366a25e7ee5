//! Illustrative source adapters. Real deployments register their own
//! `Adapter` implementations; these cover the two shapes free-proxy
//! lists commonly publish: a plain-text `ip:port` list, and a small
//! JSON array.

use super::Adapter;
use crate::error::{PoolError, Result};
use crate::models::{Candidate, ProxyProtocol};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Fetches a newline-delimited `ip:port` text list, all under one
/// assumed protocol.
pub struct PlainTextAdapter {
    name: String,
    url: String,
    protocol: ProxyProtocol,
    client: reqwest::Client,
}

impl PlainTextAdapter {
    pub fn new(name: impl Into<String>, url: impl Into<String>, protocol: ProxyProtocol) -> Self {
        PlainTextAdapter {
            name: name.into(),
            url: url.into(),
            protocol,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("static reqwest client config is valid"),
        }
    }
}

#[async_trait]
impl Adapter for PlainTextAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Candidate>> {
        let body = self
            .client
            .get(self.url.as_str())
            .send()
            .await?
            .error_for_status()
            .map_err(PoolError::Http)?
            .text()
            .await?;

        let mut candidates = Vec::new();
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_ip_port(line) {
                Some((ip, port)) => candidates.push(Candidate {
                    ip,
                    port,
                    protocol: self.protocol,
                    country: None,
                }),
                None => warn!(source = %self.name, line, "skipping unparseable line"),
            }
        }

        Ok(candidates)
    }
}

fn parse_ip_port(line: &str) -> Option<(String, u16)> {
    let (ip, port) = line.split_once(':')?;
    let port: u16 = port.trim().parse().ok()?;
    Some((ip.trim().to_string(), port))
}

#[derive(Debug, Deserialize)]
struct JsonEntry {
    ip: String,
    port: u16,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

/// Fetches a JSON array of `{ip, port, protocol?, country?}` entries.
pub struct JsonAdapter {
    name: String,
    url: String,
    default_protocol: ProxyProtocol,
    client: reqwest::Client,
}

impl JsonAdapter {
    pub fn new(name: impl Into<String>, url: impl Into<String>, default_protocol: ProxyProtocol) -> Self {
        JsonAdapter {
            name: name.into(),
            url: url.into(),
            default_protocol,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("static reqwest client config is valid"),
        }
    }
}

#[async_trait]
impl Adapter for JsonAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Candidate>> {
        let entries: Vec<JsonEntry> = self
            .client
            .get(self.url.as_str())
            .send()
            .await?
            .error_for_status()
            .map_err(PoolError::Http)?
            .json()
            .await?;

        let candidates = entries
            .into_iter()
            .filter_map(|e| {
                let protocol = e
                    .protocol
                    .as_deref()
                    .and_then(ProxyProtocol::from_str)
                    .unwrap_or(self.default_protocol);
                Some(Candidate {
                    ip: e.ip,
                    port: e.port,
                    protocol,
                    country: e.country,
                })
            })
            .collect();

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_port() {
        assert_eq!(
            parse_ip_port("203.0.113.5:8080"),
            Some(("203.0.113.5".to_string(), 8080))
        );
        assert_eq!(parse_ip_port("not-valid"), None);
        assert_eq!(parse_ip_port("203.0.113.5:notaport"), None);
    }
}
