use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tradepost_node::{run_server, NodeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::from_env()?;

    // RUST_LOG wins over the configured default level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run_server(config).await
}
