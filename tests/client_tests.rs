//! Client tests for the Odoo JSON-RPC SDK.

use httpmock::prelude::*;
use odoo_jsonrpc::{ClientConfig, Domain, Error, OdooClient, Options};
use serde_json::{json, Map, Value};

fn login_mock_body(uid: Value) -> Value {
  json!({"jsonrpc": "2.0", "id": 1, "result": uid})
}

/// Partial body matching `execute_kw` args after the session prefix
fn execute_kw_args(rest: Value) -> String {
  let mut args = vec![json!("odoo"), json!(2), json!("secret")];
  args.extend(rest.as_array().cloned().unwrap_or_default());
  json!({"params": {"args": args}}).to_string()
}

async fn logged_in(server: &MockServer) -> OdooClient {
  server
    .mock_async(|when, then| {
      when.method(POST).path("/jsonrpc").json_body_partial(
        json!({
          "method": "call",
          "params": {"service": "common", "method": "login", "args": ["odoo", "admin", "secret"]}
        })
        .to_string(),
      );
      then.status(200).json_body(login_mock_body(json!(2)));
    })
    .await;

  let config = ClientConfig::new(server.base_url(), "odoo").with_credentials("admin", "secret");
  OdooClient::connect(&config).await.unwrap()
}

#[test]
fn test_error_display() {
  let err = Error::Transport { status: 502, body: "gateway".to_string() };
  assert_eq!(format!("{}", err), "jsonrpc error response status: 502 body: gateway");

  let err = Error::Application { code: 200, message: "Odoo Server Error".to_string(), data: None };
  assert_eq!(format!("{}", err), "jsonrpc error 200: Odoo Server Error");

  let err = Error::Decode { message: "expected value".to_string(), snippet: "<html>".to_string() };
  assert_eq!(format!("{}", err), "jsonrpc decode failed: expected value; body: <html>");

  assert_eq!(format!("{}", Error::AuthFailed), "Authentication failed");
  assert_eq!(format!("{}", Error::NotAuthenticated), "Not authenticated");
  assert_eq!(format!("{}", Error::Timeout), "Timeout");
}

#[test]
fn test_error_from_json() {
  let json_err = serde_json::from_str::<Value>("invalid").unwrap_err();
  let err: Error = json_err.into();
  match err {
    Error::Serialization(_) => {}
    _ => panic!("Expected Serialization error"),
  }
}

#[test]
fn test_new_does_not_authenticate() {
  let config = ClientConfig::new("http://localhost:8069", "odoo");
  let client = OdooClient::new(&config).unwrap();
  assert_eq!(client.uid(), None);
  assert_eq!(client.database(), "odoo");
  assert_eq!(client.transport().endpoint(), "http://localhost:8069/jsonrpc");
}

#[tokio::test]
async fn test_model_call_requires_login() {
  let config = ClientConfig::new("http://localhost:8069", "odoo");
  let client = OdooClient::new(&config).unwrap();
  let err = client
    .search("res.users", &Domain::new(), &Options::new())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotAuthenticated));
}

#[tokio::test]
async fn test_version() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when
        .method(POST)
        .path("/jsonrpc")
        .json_body_partial(r#"{"params": {"service": "common", "method": "version", "args": []}}"#);
      then.status(200).json_body(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
          "server_version": "17.0",
          "server_version_info": [17, 0, 0, "final", 0, ""],
          "server_serie": "17.0",
          "protocol_version": 1
        }
      }));
    })
    .await;

  let client = OdooClient::new(&ClientConfig::new(server.base_url(), "odoo")).unwrap();
  let version = client.version().await.unwrap();
  assert_eq!(version.server_version, "17.0");
  assert_eq!(version.server_version_info.major, 17);
  assert_eq!(version.server_version_info.release_level, "final");
  assert_eq!(version.protocol_version, 1);
}

#[tokio::test]
async fn test_authenticate_stores_uid() {
  let server = MockServer::start_async().await;
  let client = logged_in(&server).await;
  assert_eq!(client.uid(), Some(2));
}

#[tokio::test]
async fn test_authenticate_rejected() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when.method(POST).path("/jsonrpc");
      then.status(200).json_body(login_mock_body(json!(false)));
    })
    .await;

  let client = OdooClient::new(&ClientConfig::new(server.base_url(), "odoo")).unwrap();
  let err = client.authenticate("admin", "wrong").await.unwrap_err();
  assert!(matches!(err, Error::AuthFailed));
  assert_eq!(client.uid(), None);
}

#[tokio::test]
async fn test_search_read_sends_domain_and_kwargs() {
  let server = MockServer::start_async().await;
  let client = logged_in(&server).await;

  let m = server
    .mock_async(|when, then| {
      when.method(POST).path("/jsonrpc").json_body_partial(
        json!({
          "params": {
            "service": "object",
            "method": "execute_kw",
            "args": [
              "odoo", 2, "secret", "res.users", "search_read",
              [["&", ["active", "=", true], ["login", "ilike", "adm"]]],
              {"fields": ["name"], "limit": 5}
            ]
          }
        })
        .to_string(),
      );
      then.status(200).json_body(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "result": [{"id": 2, "name": "Administrator"}]
      }));
    })
    .await;

  let domain = Domain::new().equals("active", true).ilike("login", "adm");
  let opts = Options::new().set_fields(["name"]).set_limit(5);
  let users = client.search_read("res.users", &domain, &opts).await.unwrap();
  m.assert_async().await;
  assert_eq!(users.len(), 1);
  assert_eq!(users[0]["name"], "Administrator");
}

#[tokio::test]
async fn test_search_drops_fields_kwarg() {
  let server = MockServer::start_async().await;
  let client = logged_in(&server).await;

  let m = server
    .mock_async(|when, then| {
      when.method(POST).path("/jsonrpc").json_body(json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": {
          "service": "object",
          "method": "execute_kw",
          "args": ["odoo", 2, "secret", "res.users", "search", [[]], {"limit": 3}]
        },
        "id": 2
      }));
      then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 2, "result": [1, 2, 3]}));
    })
    .await;

  let opts = Options::new().set_fields(["name"]).set_limit(3);
  let ids = client.search("res.users", &Domain::new(), &opts).await.unwrap();
  m.assert_async().await;
  assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_create_accepts_scalar_or_list() {
  let server = MockServer::start_async().await;
  let client = logged_in(&server).await;

  server
    .mock_async(|when, then| {
      when
        .method(POST)
        .path("/jsonrpc")
        .json_body_partial(execute_kw_args(json!(["res.partner", "create", [{"name": "A"}], {}])));
      then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 2, "result": 41}));
    })
    .await;
  server
    .mock_async(|when, then| {
      when
        .method(POST)
        .path("/jsonrpc")
        .json_body_partial(execute_kw_args(json!(["res.partner", "create", [{"name": "B"}], {}])));
      then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 3, "result": [42]}));
    })
    .await;

  let mut a = Map::new();
  a.insert("name".to_string(), json!("A"));
  let mut b = Map::new();
  b.insert("name".to_string(), json!("B"));

  assert_eq!(client.create("res.partner", a).await.unwrap(), 41);
  assert_eq!(client.create("res.partner", b).await.unwrap(), 42);
}

#[tokio::test]
async fn test_update_and_unlink() {
  let server = MockServer::start_async().await;
  let client = logged_in(&server).await;

  server
    .mock_async(|when, then| {
      when.method(POST).path("/jsonrpc").json_body_partial(execute_kw_args(json!([
        "res.partner",
        "write",
        [[7], {"name": "C"}],
        {}
      ])));
      then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 2, "result": true}));
    })
    .await;
  server
    .mock_async(|when, then| {
      when
        .method(POST)
        .path("/jsonrpc")
        .json_body_partial(execute_kw_args(json!(["res.partner", "unlink", [[7]], {}])));
      then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 3, "result": true}));
    })
    .await;

  let mut values = Map::new();
  values.insert("name".to_string(), json!("C"));
  assert!(client.update("res.partner", &[7], values).await.unwrap());
  assert!(client.unlink("res.partner", &[7]).await.unwrap());
}

#[tokio::test]
async fn test_fields_get_and_remote_error() {
  let server = MockServer::start_async().await;
  let client = logged_in(&server).await;

  server
    .mock_async(|when, then| {
      when.method(POST).path("/jsonrpc").json_body_partial(execute_kw_args(json!([
        "res.partner",
        "fields_get",
        [],
        {"allfields": ["name"]}
      ])));
      then.status(200).json_body(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "result": {"name": {"type": "char", "string": "Name"}}
      }));
    })
    .await;
  server
    .mock_async(|when, then| {
      when
        .method(POST)
        .path("/jsonrpc")
        .json_body_partial(execute_kw_args(json!(["no.model"])));
      then.status(200).json_body(json!({
        "jsonrpc": "2.0",
        "id": 3,
        "error": {"code": 200, "message": "Odoo Server Error"}
      }));
    })
    .await;

  let meta = client.fields_get("res.partner", &["name"], &Options::new()).await.unwrap();
  assert_eq!(meta["name"]["type"], "char");

  let err = client
    .call_method::<Value>("no.model", "anything", Vec::new(), &Options::new())
    .await
    .unwrap_err();
  assert!(err.is_application());
}
