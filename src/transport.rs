//! JSON-RPC 2.0 transport over HTTP.
//!
//! One [`Transport::call`] is one POST round trip. Responses are classified
//! in a fixed order: HTTP status, envelope decoding, the remote `error`
//! member, then decoding of `result` into the caller's type.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::CONTENT_TYPE;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::protocol::{Request, Response, ENDPOINT_SUFFIX, MAX_SNIPPET_LEN};

/// Transport construction options
#[derive(Debug, Default)]
pub struct TransportOptions {
  /// Fully configured client, used as is. Cookie handling is then up to the caller.
  pub http_client: Option<reqwest::Client>,
  /// Builder for the underlying client; a cookie jar is attached to it.
  pub client_builder: Option<reqwest::ClientBuilder>,
  /// Jar shared with other clients. A fresh one is created when unset.
  pub cookie_jar: Option<Arc<Jar>>,
  /// Deadline applied to every call
  pub timeout: Option<Duration>,
}

impl TransportOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
    self.http_client = Some(client);
    self
  }

  pub fn with_client_builder(mut self, builder: reqwest::ClientBuilder) -> Self {
    self.client_builder = Some(builder);
    self
  }

  /// Ignored when a prebuilt client is supplied with `with_http_client`
  pub fn with_cookie_jar(mut self, jar: Arc<Jar>) -> Self {
    self.cookie_jar = Some(jar);
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}

/// JSON-RPC client bound to one endpoint.
///
/// Safe to share between tasks. Request ids come from a counter owned by
/// the instance, so concurrent calls never reuse an id. Dropping the future
/// returned by [`Transport::call`] aborts that request only.
#[derive(Debug)]
pub struct Transport {
  endpoint: String,
  http: reqwest::Client,
  cookie_jar: Option<Arc<Jar>>,
  timeout: Option<Duration>,
  next_id: AtomicU64,
}

impl Transport {
  /// Create a transport with a cookie-enabled default client
  pub fn new(base_url: &str) -> Result<Self> {
    Self::with_options(base_url, TransportOptions::default())
  }

  pub fn with_options(base_url: &str, options: TransportOptions) -> Result<Self> {
    let endpoint = normalize_endpoint(base_url)?;

    let (http, cookie_jar) = match options.http_client {
      Some(client) => {
        if options.cookie_jar.is_some() || options.client_builder.is_some() {
          tracing::debug!("cookie jar and client builder ignored for a prebuilt http client");
        }
        (client, None)
      }
      None => {
        let jar = options.cookie_jar.unwrap_or_default();
        let builder = options.client_builder.unwrap_or_else(reqwest::Client::builder);
        let client = builder.cookie_provider(Arc::clone(&jar)).build()?;
        (client, Some(jar))
      }
    };

    Ok(Self {
      endpoint,
      http,
      cookie_jar,
      timeout: options.timeout,
      next_id: AtomicU64::new(0),
    })
  }

  /// Normalized endpoint, always ending in `/jsonrpc`
  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  /// Jar attached by this transport, `None` for a caller-supplied client
  pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
    self.cookie_jar.as_ref()
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout
  }

  pub(crate) fn next_id(&self) -> u64 {
    self.next_id.fetch_add(1, Ordering::Relaxed) + 1
  }

  /// Perform one request and decode `result` into `R`.
  ///
  /// `R` may be list- or scalar-shaped; no normalization happens here.
  #[tracing::instrument(level = "debug", skip(self, params), fields(id = tracing::field::Empty))]
  pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
  where
    P: Serialize + ?Sized,
    R: DeserializeOwned,
  {
    let id = self.next_id();
    tracing::Span::current().record("id", id);

    let body = serde_json::to_vec(&Request::new(method, params, id))?;
    let round_trip = self.round_trip(body);
    let bytes = match self.timeout {
      Some(limit) => tokio::time::timeout(limit, round_trip)
        .await
        .map_err(|_| Error::Timeout)??,
      None => round_trip.await?,
    };

    decode(id, &bytes)
  }

  /// Perform one request and discard `result`
  pub async fn call_discard<P>(&self, method: &str, params: &P) -> Result<()>
  where
    P: Serialize + ?Sized,
  {
    self.call::<P, IgnoredAny>(method, params).await.map(|_| ())
  }

  async fn round_trip(&self, body: Vec<u8>) -> Result<Vec<u8>> {
    tracing::debug!(endpoint = %self.endpoint, len = body.len(), "sending request");
    let resp = self
      .http
      .post(&self.endpoint)
      .header(CONTENT_TYPE, "application/json")
      .body(body)
      .send()
      .await?;

    let status = resp.status();
    let bytes = resp.bytes().await?;
    tracing::debug!(status = status.as_u16(), len = bytes.len(), "received response");

    if !status.is_success() {
      return Err(Error::Transport {
        status: status.as_u16(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
      });
    }
    Ok(bytes.to_vec())
  }
}

fn normalize_endpoint(base_url: &str) -> Result<String> {
  let trimmed = base_url.trim_end_matches('/');
  let endpoint = if trimmed.ends_with(ENDPOINT_SUFFIX) {
    trimmed.to_string()
  } else {
    format!("{trimmed}{ENDPOINT_SUFFIX}")
  };

  reqwest::Url::parse(&endpoint).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
  Ok(endpoint)
}

fn decode<R: DeserializeOwned>(id: u64, body: &[u8]) -> Result<R> {
  let envelope: Response = serde_json::from_slice(body).map_err(|e| Error::Decode {
    message: e.to_string(),
    snippet: snippet(body),
  })?;

  if envelope.id.is_some_and(|got| got != id) {
    tracing::debug!(expected = id, got = ?envelope.id, "response id does not match request");
  }

  if let Some(err) = envelope.error {
    return Err(Error::Application {
      code: err.code,
      message: err.message,
      data: err.data,
    });
  }

  serde_json::from_value(envelope.result).map_err(|e| Error::Decode {
    message: format!("failed to unmarshal result: {e}"),
    snippet: snippet(body),
  })
}

/// Lossy UTF-8 prefix of `body`, at most `MAX_SNIPPET_LEN` bytes
fn snippet(body: &[u8]) -> String {
  let text = String::from_utf8_lossy(body);
  let mut end = text.len().min(MAX_SNIPPET_LEN);
  while !text.is_char_boundary(end) {
    end -= 1;
  }
  text[..end].to_string()
}
