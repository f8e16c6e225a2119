use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use prodfinder_core::config::Config;
use prodfinder_server::{serve, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let addr: SocketAddr = config.server.addr.parse()?;

    // A failed initialization is held inside the state; the server still
    // comes up and answers 503s so the front end can report the problem.
    let state = AppState::from_config(&config);
    serve(state, addr, &config.server.public_dir).await?;
    Ok(())
}
