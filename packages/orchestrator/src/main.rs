mod api;
mod config;
mod cosmos;
mod denom_cache;
mod eth;
mod events;
mod metrics;
mod oracle;
mod relayer;
mod retry;
mod sink;

use std::sync::Arc;
use std::time::Duration;

use api::{OrchestratorStatus, SharedStatus};
use config::Config;
use cosmos::CosmosQueryClient;
use denom_cache::DenomCache;
use eth::EthClient;
use oracle::Oracle;
use relayer::Relayer;
use sink::SignerDaemonClient;
use tokio::sync::RwLock;

fn main() -> eyre::Result<()> {
    // Install color-eyre for better error reporting
    color_eyre::install()?;

    // Run the async main
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    // Initialize logging
    init_logging();

    tracing::info!("Starting Gravity Orchestrator");

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        bridge_id = %config.bridge_id,
        cosmos_chain_id = %config.cosmos.chain_id,
        gravity_contract = %config.ethereum.gravity_address,
        "Configuration loaded"
    );

    // Startup invariant: the two commitment schemas must be inside the
    // encoder's supported subset; abort before any loop runs if not
    gravity_rs::commitment::init_schemas();

    // Build clients
    let eth = EthClient::new(&config.ethereum)?;
    match eth.chain_id().await {
        Ok(chain_id) => tracing::info!(chain_id, "Connected to Ethereum RPC"),
        Err(e) => tracing::warn!(error = %e, "Ethereum RPC not reachable yet"),
    }

    let cosmos = CosmosQueryClient::new(&config.cosmos.lcd_url);
    match cosmos.current_valset().await {
        Ok(valset) => tracing::info!(
            valset_nonce = valset.nonce,
            members = valset.members.len(),
            "Connected to Cosmos LCD"
        ),
        Err(e) => tracing::warn!(error = %e, "Cosmos LCD not reachable yet"),
    }

    let denoms = Arc::new(DenomCache::new(
        cosmos.clone(),
        config.orchestrator.denom_lookup_timeout,
    ));
    let signer = SignerDaemonClient::new(&config.orchestrator.signer_url);

    // Build the loops
    let oracle = Oracle::new(
        eth.clone(),
        denoms.clone(),
        config.finality.clone(),
        signer.clone(),
        config.ethereum.start_block,
        config.ethereum.max_scan_range,
        config.orchestrator.poll_interval,
    );
    let relayer = Relayer::new(
        cosmos.clone(),
        signer,
        config.bridge_id,
        config.cosmos.orchestrator_address.clone(),
        config.orchestrator.poll_interval,
    );

    // Create shutdown channel and signal handler
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(()).await;
    });

    // Start metrics/status API server
    let status: SharedStatus = Arc::new(RwLock::new(OrchestratorStatus::default()));
    let api_addr = std::net::SocketAddr::from(([0, 0, 0, 0], 9090));
    let api_status = status.clone();
    tokio::spawn(async move {
        if let Err(e) = api::start_api_server(api_addr, api_status).await {
            tracing::error!(error = %e, "API server error");
        }
    });

    tracing::info!("Loops initialized, starting processing");

    // Run oracle, relayer, and housekeeping concurrently
    tokio::select! {
        _ = shutdown_rx.recv() => {
            tracing::info!("Shutdown signal received, stopping");
        }
        result = oracle.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Oracle stopped with error");
            }
        }
        result = relayer.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Relayer stopped with error");
            }
        }
        result = run_housekeeping(eth, cosmos, denoms, status) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Housekeeping stopped with error");
            }
        }
    }

    tracing::info!("Gravity Orchestrator stopped");
    Ok(())
}

/// Periodic heartbeat: refresh chain heights and cache gauges for the
/// status/metrics endpoints
async fn run_housekeeping(
    eth: EthClient,
    cosmos: CosmosQueryClient,
    denoms: Arc<DenomCache<CosmosQueryClient>>,
    status: SharedStatus,
) -> eyre::Result<()> {
    let mut tick = tokio::time::interval(Duration::from_secs(15));
    loop {
        tick.tick().await;

        match eth.latest_block_number().await {
            Ok(height) => {
                metrics::record_eth_height(height);
                status.write().await.eth_height = height;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Housekeeping: Ethereum height unavailable");
                metrics::record_error("housekeeping", "eth_height");
            }
        }

        match cosmos.latest_block_height().await {
            Ok(height) => {
                metrics::record_cosmos_height(height);
                status.write().await.cosmos_height = height;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Housekeeping: Cosmos height unavailable");
                metrics::record_error("housekeeping", "cosmos_height");
            }
        }

        let entries = denoms.len().await;
        metrics::set_denom_cache_entries(entries);
        {
            let mut status = status.write().await;
            status.denom_cache_entries = entries;
            status.oracle_block = metrics::ORACLE_BLOCK.get() as u64;
        }

        metrics::record_successful_poll("housekeeping");
    }
}

/// Initialize tracing/logging with structured output
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gravity_orchestrator=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();
}

/// Wait for shutdown signals (SIGINT/SIGTERM)
async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
