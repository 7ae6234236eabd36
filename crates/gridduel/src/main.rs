//! Binary entry point for the gridduel server.

use gridduel::{GridduelServerBuilder, ServerConfig};
use gridduel_session::FileCredentialStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let credentials = FileCredentialStore::open(&config.login_file).await?;

    tracing::info!(
        addr = %config.socket_addr(),
        max_players = config.max_players,
        login_file = %config.login_file,
        "starting gridduel server"
    );

    let server = GridduelServerBuilder::from_config(&config)
        .build(credentials)
        .await?;
    server.run().await?;
    Ok(())
}
