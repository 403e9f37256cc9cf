//! Model-level client built on the JSON-RPC transport.
//!
//! Every call goes through the `call` dispatcher: `common.version` and
//! `common.login` need no session, everything else is routed through
//! `object.execute_kw` with the credentials stored by
//! [`OdooClient::authenticate`].

use std::env;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::options::Options;
use crate::protocol::{ServerVersion, ServiceCall};
use crate::transport::{Transport, TransportOptions};

/// A record as returned by `read` and `search_read`
pub type Record = Map<String, Value>;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub url: String,
  pub database: String,
  pub username: Option<String>,
  pub password: Option<String>,
  pub timeout: Option<Duration>,
}

impl ClientConfig {
  pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      database: database.into(),
      username: None,
      password: None,
      timeout: None,
    }
  }

  /// Read `ODOO_URL` and `ODOO_DB`, plus optional `ODOO_USER` and `ODOO_PASSWORD`
  pub fn from_env() -> std::result::Result<Self, env::VarError> {
    let mut config = Self::new(env::var("ODOO_URL")?, env::var("ODOO_DB")?);
    config.username = env::var("ODOO_USER").ok();
    config.password = env::var("ODOO_PASSWORD").ok();
    Ok(config)
  }

  pub fn with_credentials(
    mut self,
    username: impl Into<String>,
    password: impl Into<String>,
  ) -> Self {
    self.username = Some(username.into());
    self.password = Some(password.into());
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}

#[derive(Clone)]
struct Session {
  uid: i64,
  password: String,
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session").field("uid", &self.uid).finish_non_exhaustive()
  }
}

/// Some model methods answer with either one value or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
  One(T),
  Many(Vec<T>),
}

impl<T> OneOrMany<T> {
  fn into_first(self) -> Option<T> {
    match self {
      OneOrMany::One(v) => Some(v),
      OneOrMany::Many(v) => v.into_iter().next(),
    }
  }
}

/// Odoo client
#[derive(Debug)]
pub struct OdooClient {
  transport: Transport,
  database: String,
  session: RwLock<Option<Session>>,
}

impl OdooClient {
  /// Create a client without touching the network
  pub fn new(config: &ClientConfig) -> Result<Self> {
    let mut options = TransportOptions::new();
    if let Some(timeout) = config.timeout {
      options = options.with_timeout(timeout);
    }
    Ok(Self::with_transport(
      Transport::with_options(&config.url, options)?,
      &config.database,
    ))
  }

  pub fn with_transport(transport: Transport, database: impl Into<String>) -> Self {
    Self {
      transport,
      database: database.into(),
      session: RwLock::new(None),
    }
  }

  /// Create a client and log in when the config carries credentials
  pub async fn connect(config: &ClientConfig) -> Result<Self> {
    let client = Self::new(config)?;
    if let (Some(user), Some(password)) = (&config.username, &config.password) {
      client.authenticate(user, password).await?;
    }
    Ok(client)
  }

  pub fn transport(&self) -> &Transport {
    &self.transport
  }

  pub fn database(&self) -> &str {
    &self.database
  }

  /// Uid of the logged-in user, if any
  pub fn uid(&self) -> Option<i64> {
    self.read_session().map(|s| s.uid)
  }

  fn read_session(&self) -> Option<Session> {
    self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  async fn service<R: DeserializeOwned>(
    &self,
    service: &str,
    method: &str,
    args: Vec<Value>,
  ) -> Result<R> {
    let params = ServiceCall { service, method, args };
    self.transport.call("call", &params).await
  }

  /// Server version metadata
  pub async fn version(&self) -> Result<ServerVersion> {
    self.service("common", "version", Vec::new()).await
  }

  /// Log in and keep the uid and password for later model calls
  pub async fn authenticate(&self, username: &str, password: &str) -> Result<i64> {
    let answer: Value = self
      .service("common", "login", vec![json!(self.database), json!(username), json!(password)])
      .await?;

    let uid = match answer.as_i64() {
      Some(uid) if uid > 0 => uid,
      _ => return Err(Error::AuthFailed),
    };

    *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(Session {
      uid,
      password: password.to_string(),
    });
    tracing::info!(uid, database = %self.database, "authenticated");
    Ok(uid)
  }

  /// Call any model method through `execute_kw`
  pub async fn execute_kw<R: DeserializeOwned>(
    &self,
    model: &str,
    method: &str,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
  ) -> Result<R> {
    let session = self.read_session().ok_or(Error::NotAuthenticated)?;
    tracing::debug!(model, method, "execute_kw");
    self
      .service(
        "object",
        "execute_kw",
        vec![
          json!(self.database),
          json!(session.uid),
          json!(session.password),
          json!(model),
          json!(method),
          Value::Array(args),
          Value::Object(kwargs),
        ],
      )
      .await
  }

  pub async fn search_read(
    &self,
    model: &str,
    domain: &Domain,
    opts: &Options,
  ) -> Result<Vec<Record>> {
    self
      .execute_kw(model, "search_read", vec![serde_json::to_value(domain)?], opts.kwargs())
      .await
  }

  /// Ids of the records matching `domain`. `opts.fields` is not sent.
  pub async fn search(&self, model: &str, domain: &Domain, opts: &Options) -> Result<Vec<i64>> {
    let mut kwargs = opts.kwargs();
    kwargs.remove("fields");
    self
      .execute_kw(model, "search", vec![serde_json::to_value(domain)?], kwargs)
      .await
  }

  pub async fn search_count(&self, model: &str, domain: &Domain) -> Result<i64> {
    self
      .execute_kw(model, "search_count", vec![serde_json::to_value(domain)?], Map::new())
      .await
  }

  pub async fn read(&self, model: &str, ids: &[i64], opts: &Options) -> Result<Vec<Record>> {
    self.execute_kw(model, "read", vec![json!(ids)], opts.kwargs()).await
  }

  /// Create one record and return its id
  pub async fn create(&self, model: &str, values: Map<String, Value>) -> Result<i64> {
    let created: OneOrMany<i64> = self
      .execute_kw(model, "create", vec![Value::Object(values)], Map::new())
      .await?;
    created.into_first().ok_or_else(|| Error::Decode {
      message: format!("create on {model} returned no id"),
      snippet: "[]".to_string(),
    })
  }

  pub async fn update(&self, model: &str, ids: &[i64], values: Map<String, Value>) -> Result<bool> {
    self
      .execute_kw(model, "write", vec![json!(ids), Value::Object(values)], Map::new())
      .await
  }

  pub async fn unlink(&self, model: &str, ids: &[i64]) -> Result<bool> {
    self.execute_kw(model, "unlink", vec![json!(ids)], Map::new()).await
  }

  /// Field metadata of `model`, restricted to `fields` when non-empty
  pub async fn fields_get(
    &self,
    model: &str,
    fields: &[&str],
    opts: &Options,
  ) -> Result<Map<String, Value>> {
    let mut kwargs = opts.kwargs();
    kwargs.remove("fields");
    if !fields.is_empty() {
      kwargs.insert("allfields".to_string(), json!(fields));
    }
    self.execute_kw(model, "fields_get", Vec::new(), kwargs).await
  }

  /// Call an arbitrary public model method
  pub async fn call_method<R: DeserializeOwned>(
    &self,
    model: &str,
    method: &str,
    args: Vec<Value>,
    opts: &Options,
  ) -> Result<R> {
    self.execute_kw(model, method, args, opts.kwargs()).await
  }
}
