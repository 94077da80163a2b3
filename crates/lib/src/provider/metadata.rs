//! HTTP client for the Rancher metadata service.
//!
//! Every endpoint lives under `{url}/{prefix}` and answers JSON when asked for
//! it. Change detection uses the service's version long-poll:
//! `GET /version?wait=true&value=<known>&maxWait=<secs>` blocks until the
//! version differs from `<known>` or the wait expires.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Provider, ProviderError};
use crate::consts::{APP_NAME, REQUEST_TIMEOUT_SECS};
use crate::snapshot::Stack;

/// Metadata service client.
#[derive(Debug, Clone)]
pub struct MetadataClient {
  http: reqwest::Client,
  base_url: String,
}

impl MetadataClient {
  /// Create a client for `{url}/{prefix}`.
  pub fn new(url: &str, prefix: &str) -> Result<Self, ProviderError> {
    let base_url = format!("{}/{}", url.trim_end_matches('/'), prefix.trim_matches('/'));
    let http = reqwest::Client::builder()
      .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|source| ProviderError::Request {
        url: base_url.clone(),
        source,
      })?;

    Ok(Self { http, base_url })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Current topology version, without waiting.
  pub async fn version(&self) -> Result<String, ProviderError> {
    let body = self.get_text("/version", &[], request_timeout()).await?;
    Ok(parse_version(&body))
  }

  async fn send(
    &self,
    path: &str,
    query: &[(&str, String)],
    timeout: Duration,
  ) -> Result<(String, reqwest::Response), ProviderError> {
    let url = format!("{}{}", self.base_url, path);
    debug!(url = %url, "requesting metadata");

    let response = self
      .http
      .get(&url)
      .header(ACCEPT, "application/json")
      .query(query)
      .timeout(timeout)
      .send()
      .await
      .map_err(|source| ProviderError::Request {
        url: url.clone(),
        source,
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(ProviderError::Status { url, status });
    }

    Ok((url, response))
  }

  async fn get_text(&self, path: &str, query: &[(&str, String)], timeout: Duration) -> Result<String, ProviderError> {
    let (url, response) = self.send(path, query, timeout).await?;
    response.text().await.map_err(|source| ProviderError::Decode { url, source })
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
    let (url, response) = self.send(path, &[], request_timeout()).await?;
    response.json().await.map_err(|source| ProviderError::Decode { url, source })
  }
}

#[async_trait]
impl Provider for MetadataClient {
  async fn connect(&self) -> Result<(), ProviderError> {
    let version = self.version().await?;
    debug!(url = %self.base_url, version = %version, "metadata service reachable");
    Ok(())
  }

  async fn wait_version(&self, current: &str, max_wait: Duration) -> Result<String, ProviderError> {
    let query = [
      ("wait", "true".to_string()),
      ("value", current.to_string()),
      ("maxWait", max_wait.as_secs().to_string()),
    ];
    let body = self.get_text("/version", &query, max_wait + request_timeout()).await?;
    Ok(parse_version(&body))
  }

  async fn stacks(&self) -> Result<Vec<Stack>, ProviderError> {
    self.get_json("/stacks").await
  }

  async fn self_stack(&self) -> Result<Stack, ProviderError> {
    self.get_json("/self/stack").await
  }
}

fn request_timeout() -> Duration {
  Duration::from_secs(REQUEST_TIMEOUT_SECS)
}

/// The version endpoint answers either a bare token or a JSON string.
fn parse_version(body: &str) -> String {
  let trimmed = body.trim();
  serde_json::from_str::<String>(trimmed).unwrap_or_else(|_| trimmed.to_string())
}
