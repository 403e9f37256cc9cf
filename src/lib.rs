//! Odoo JSON-RPC Rust Client SDK
//!
//! An async client for the Odoo JSON-RPC API, with a builder for search
//! domains.
//!
//! # Example
//!
//! ```no_run
//! use odoo_jsonrpc::{ClientConfig, Domain, OdooClient, Options};
//!
//! #[tokio::main]
//! async fn main() -> odoo_jsonrpc::Result<()> {
//!     // Connect and log in
//!     let config = ClientConfig::new("http://localhost:8069", "odoo")
//!         .with_credentials("admin", "admin");
//!     let client = OdooClient::connect(&config).await?;
//!
//!     // Active partners named like "Acme", or any company
//!     let domain = Domain::new()
//!         .equals("active", true)
//!         .ilike("name", "acme")
//!         .or([Domain::new().equals("is_company", true)]);
//!
//!     let partners = client
//!         .search_read("res.partner", &domain, &Options::new().set_fields(["name"]).set_limit(10))
//!         .await?;
//!
//!     println!("Found: {:?}", partners);
//!     Ok(())
//! }
//! ```

mod client;
pub mod domain;
mod error;
pub mod options;
pub mod protocol;
pub mod transport;

pub use client::{ClientConfig, OdooClient, Record};
pub use domain::{Clause, Domain, Node, Operator};
pub use error::{Error, Result};
pub use options::Options;
pub use protocol::{
  RpcError, ServerVersion, VersionInfo, ENDPOINT_SUFFIX, JSONRPC_VERSION, MAX_DOMAIN_DEPTH,
  MAX_SNIPPET_LEN,
};
pub use transport::{Transport, TransportOptions};
