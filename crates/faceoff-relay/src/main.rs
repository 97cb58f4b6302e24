//! `faceoff-relay` binary.
//!
//! ```text
//! FACEOFF_BIND=0.0.0.0:8080 FACEOFF_CATALOG=catalog.jsonl RUST_LOG=debug faceoff-relay
//! ```

use faceoff_relay::{RelayConfig, RelayServer};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let config = RelayConfig::from_env();
    let server = RelayServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "relay listening");

    server.run().await?;
    Ok(())
}
