use crate::config::{env_timeout, Settings};
use crate::error::{Upstream, UpstreamError};
use crate::grants::GrantsSearch;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GrantsGovClient {
    http: reqwest::Client,
    search_url: String,
}

impl GrantsGovClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = env_timeout("GRANTS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);

        Self::new(
            settings.grants_search_url.clone(),
            timeout,
        )
    }

    pub fn new(search_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Grants.gov http client")?;

        Ok(Self { http, search_url })
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

#[async_trait::async_trait]
impl GrantsSearch for GrantsGovClient {
    async fn search(&self, criteria: &Value) -> anyhow::Result<Value> {
        let res = self
            .http
            .post(&self.search_url)
            .headers(Self::headers())
            .json(criteria)
            .send()
            .await
            .context("Grants.gov request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Grants.gov response body")?;

        if !status.is_success() {
            tracing::warn!(%status, "Grants.gov returned non-success status");
            return Err(UpstreamError {
                upstream: Upstream::GrantsGov,
                status,
                body: text,
            }
            .into());
        }

        serde_json::from_str::<Value>(&text)
            .with_context(|| format!("Grants.gov response is not valid JSON: {text}"))
    }
}
