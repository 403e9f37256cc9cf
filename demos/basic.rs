//! Basic example demonstrating Odoo JSON-RPC SDK usage.
//!
//! Reads `ODOO_URL`, `ODOO_DB`, `ODOO_USER` and `ODOO_PASSWORD`.

use odoo_jsonrpc::{ClientConfig, Domain, OdooClient, Options};
use serde_json::{json, Map};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  // Connect and log in
  let config = ClientConfig::from_env()?;
  let client = OdooClient::connect(&config).await?;

  let version = client.version().await?;
  println!("Connected to Odoo {} (uid {:?})", version.server_version, client.uid());

  // Search partners
  let domain = Domain::new()
    .equals("active", true)
    .ilike("name", "a")
    .or([Domain::new().equals("is_company", true)]);
  println!("Domain: {}", domain);

  let opts = Options::new().set_fields(["name", "email"]).set_limit(5).set_order("name asc");
  let partners = client.search_read("res.partner", &domain, &opts).await?;
  for p in &partners {
    println!("  {} <{}>", p["name"], p["email"]);
  }

  // Create, update and delete a record
  let mut values = Map::new();
  values.insert("name".to_string(), json!("SDK Demo Partner"));
  let id = client.create("res.partner", values).await?;
  println!("Created partner {}", id);

  let mut values = Map::new();
  values.insert("email".to_string(), json!("demo@example.com"));
  client.update("res.partner", &[id], values).await?;

  let count = client
    .search_count("res.partner", &Domain::new().equals("email", "demo@example.com"))
    .await?;
  println!("Partners with demo email: {}", count);

  client.unlink("res.partner", &[id]).await?;
  println!("Deleted partner {}", id);

  Ok(())
}
