//! Error types for the Odoo JSON-RPC client SDK.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Serialization error: {0}")]
  Serialization(String),

  #[error("Invalid URL: {0}")]
  InvalidUrl(String),

  #[error("Invalid domain: {0}")]
  InvalidDomain(String),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("jsonrpc error response status: {status} body: {body}")]
  Transport { status: u16, body: String },

  #[error("jsonrpc decode failed: {message}; body: {snippet}")]
  Decode { message: String, snippet: String },

  #[error("jsonrpc error {code}: {message}")]
  Application {
    code: i64,
    message: String,
    data: Option<serde_json::Value>,
  },

  #[error("Timeout")]
  Timeout,

  #[error("Authentication failed")]
  AuthFailed,

  #[error("Not authenticated")]
  NotAuthenticated,
}

impl Error {
  /// The remote service answered with a JSON-RPC `error` member.
  pub fn is_application(&self) -> bool {
    matches!(self, Self::Application { .. })
  }

  /// The request never produced a usable HTTP response.
  pub fn is_transport(&self) -> bool {
    matches!(self, Self::Http(_) | Self::Transport { .. } | Self::Timeout)
  }

  /// The body, or its `result` member, did not decode into the expected shape.
  pub fn is_decode(&self) -> bool {
    matches!(self, Self::Decode { .. })
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Self::Serialization(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, Error>;
