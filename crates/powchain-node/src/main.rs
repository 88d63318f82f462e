use clap::Parser;
use powchain_node::{
    router, tasks::spawn_consensus_task, AppState, Args, HttpChainFetcher, NodeConfig,
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = NodeConfig::from_args(Args::parse())?;
    let fetcher = HttpChainFetcher::new(config.fetch_timeout)?;
    let state = AppState::new(&config, fetcher);
    info!(node_id = %state.node_id, peers = state.peers.len(), "node identity");

    if let Some(every) = config.resolve_interval {
        spawn_consensus_task(state.clone(), every);
    }

    let shutdown = state.shutdown.clone();
    let app = router(state);

    info!("powchain-node listening on http://{}", config.listen);
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down, aborting in-flight mining");
            shutdown.cancel();
        })
        .await?;
    Ok(())
}
