//! Async HTTP plumbing shared by the gateway and the history reader.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Default REST base when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/v2";

/// Connection settings for the directory server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the request/response API, e.g. `http://host:8000/v2`.
  pub api_url:  String,
  /// Base URL of the push transport. Derived from `api_url` when unset.
  pub push_url: Option<String>,
  pub timeout:  Duration,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      api_url:  DEFAULT_API_URL.to_string(),
      push_url: None,
      timeout:  Duration::from_secs(30),
    }
  }
}

impl ClientConfig {
  /// Full URL of the snapshot subscription endpoint.
  ///
  /// `http` becomes `ws` and `https` becomes `wss` when the push base is
  /// derived from the API base.
  pub fn push_endpoint(&self) -> Result<String> {
    let base = match &self.push_url {
      Some(url) => url.clone(),
      None => {
        let api = self.api_url.as_str();
        if let Some(rest) = api.strip_prefix("https://") {
          format!("wss://{rest}")
        } else if let Some(rest) = api.strip_prefix("http://") {
          format!("ws://{rest}")
        } else {
          api.to_string()
        }
      }
    };
    if !(base.starts_with("ws://") || base.starts_with("wss://")) {
      return Err(Error::Url(base));
    }
    Ok(format!("{}/contacts", base.trim_end_matches('/')))
  }
}

/// Async HTTP client for the directory REST API.
///
/// Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
  client: Client,
  config: ClientConfig,
}

impl ApiClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &ClientConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
  }

  pub(crate) fn get(&self, path: &str) -> RequestBuilder { self.client.get(self.url(path)) }

  pub(crate) fn post(&self, path: &str) -> RequestBuilder { self.client.post(self.url(path)) }

  pub(crate) fn put(&self, path: &str) -> RequestBuilder { self.client.put(self.url(path)) }

  pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
    self.client.delete(self.url(path))
  }

  /// Send `req` and turn any non-2xx status into [`Error::Status`].
  ///
  /// `what` names the call in logs, e.g. `"PUT /contacts/3"`.
  pub(crate) async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    tracing::debug!(request = what, "sending");
    let resp = req.send().await.inspect_err(|e| {
      tracing::warn!(request = what, error = %e, "request failed");
    })?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body);
    tracing::warn!(request = what, %status, message = message.as_deref(), "request rejected");
    Err(Error::Status { status, message })
  }

  /// [`send`](Self::send), then decode the JSON body.
  pub(crate) async fn send_json<T: DeserializeOwned>(
    &self,
    req: RequestBuilder,
    what: &str,
  ) -> Result<T> {
    let resp = self.send(req, what).await?;
    Ok(resp.json().await?)
  }
}

/// Pull a human-readable message out of an error body.
///
/// The directory server answers `{"message": ...}`; framework-generated
/// errors use `{"detail": ...}` instead.
fn error_message(body: &str) -> Option<String> {
  let value: serde_json::Value = serde_json::from_str(body).ok()?;
  ["message", "detail"]
    .iter()
    .find_map(|key| value.get(key)?.as_str())
    .filter(|m| !m.is_empty())
    .map(str::to_string)
}
