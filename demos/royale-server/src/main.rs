//! Runs a Tic-Tac-Toe Royale server.
//!
//! ```text
//! ROYALE_BIND=127.0.0.1:9000 RUST_LOG=royale=debug cargo run -p royale-server
//! ```

use royale::{MatchConfig, RoyaleServer};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let bind = std::env::var("ROYALE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

    let server = RoyaleServer::builder()
        .bind(&bind)
        .match_config(MatchConfig::default())
        .build()
        .await?;

    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await?;
    Ok(())
}
