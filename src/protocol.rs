//! Wire protocol types and serialization for the Odoo JSON-RPC API.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version literal sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

/// Routing suffix every endpoint must end with
pub const ENDPOINT_SUFFIX: &str = "/jsonrpc";

/// Upper bound on the raw body echoed back in decode errors
pub const MAX_SNIPPET_LEN: usize = 200;

/// Deepest operator nesting accepted when parsing a wire domain
pub const MAX_DOMAIN_DEPTH: usize = 1024;

/// Request envelope
#[derive(Debug, Serialize)]
pub struct Request<'a, P: ?Sized> {
  pub jsonrpc: &'static str,
  pub method: &'a str,
  pub params: &'a P,
  pub id: u64,
}

impl<'a, P: ?Sized> Request<'a, P> {
  pub fn new(method: &'a str, params: &'a P, id: u64) -> Self {
    Self {
      jsonrpc: JSONRPC_VERSION,
      method,
      params,
      id,
    }
  }
}

/// Error member of a response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
  pub code: i64,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
}

/// Response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
  #[serde(default)]
  pub jsonrpc: String,
  #[serde(default)]
  pub result: Value,
  #[serde(default)]
  pub error: Option<RpcError>,
  #[serde(default)]
  pub id: Option<u64>,
}

/// Params of the service dispatcher behind the `call` method
#[derive(Debug, Clone, Serialize)]
pub struct ServiceCall<'a> {
  pub service: &'a str,
  pub method: &'a str,
  pub args: Vec<Value>,
}

/// Server metadata returned by `common.version`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerVersion {
  #[serde(default)]
  pub server_version: String,
  #[serde(default)]
  pub server_version_info: VersionInfo,
  #[serde(default)]
  pub server_serie: String,
  #[serde(default)]
  pub protocol_version: i64,
}

/// Structured form of `server_version_info`.
///
/// The server sends a positional array such as `[17, 0, 0, "final", 0, ""]`.
/// Short arrays leave the missing trailing members at their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionInfo {
  pub major: i64,
  pub minor: i64,
  pub patch: i64,
  pub release_level: String,
  pub serial: i64,
  pub full_version: String,
}

impl<'de> Deserialize<'de> for VersionInfo {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    fn at<T: de::DeserializeOwned + Default, E: de::Error>(
      raw: &[Value],
      index: usize,
    ) -> Result<T, E> {
      match raw.get(index) {
        Some(v) => T::deserialize(v).map_err(|e| E::custom(format!("version info [{index}]: {e}"))),
        None => Ok(T::default()),
      }
    }

    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(Self {
      major: at::<_, D::Error>(&raw, 0)?,
      minor: at::<_, D::Error>(&raw, 1)?,
      patch: at::<_, D::Error>(&raw, 2)?,
      release_level: at::<_, D::Error>(&raw, 3)?,
      serial: at::<_, D::Error>(&raw, 4)?,
      full_version: at::<_, D::Error>(&raw, 5)?,
    })
  }
}
