use clap::Parser;
use smarttour_core::{config, RatingStore, Recommender, RecommenderConfig};
use smarttour_server::api::create_router;
use smarttour_server::api::handlers::AppState;
use smarttour_server::api::metrics;
use smarttour_server::loader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smarttour", about = "Tourist destination recommendation server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SMARTTOUR_PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Data directory for the ratings WAL and snapshot
    #[arg(short, long, env = "SMARTTOUR_DATA_DIR", default_value = config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Catalog file: JSON array of {id?, name, category, state, description?, aggregate_rating?}
    #[arg(short, long, env = "SMARTTOUR_CATALOG")]
    catalog: PathBuf,

    /// Ratings file to import when the store is empty: JSON array of {user_id, item_id | place_name, score}
    #[arg(long, env = "SMARTTOUR_IMPORT_RATINGS")]
    import_ratings: Option<PathBuf>,

    /// Snapshot interval in seconds (0 = disabled)
    #[arg(long, env = "SMARTTOUR_SNAPSHOT_INTERVAL", default_value_t = config::DEFAULT_SNAPSHOT_INTERVAL_SECS)]
    snapshot_interval: u64,

    /// Number of results when a request omits top_n
    #[arg(long, env = "SMARTTOUR_DEFAULT_TOP_N", default_value_t = config::DEFAULT_TOP_N)]
    default_top_n: usize,

    /// Only the k most similar users contribute to collaborative scores (default: all)
    #[arg(long, env = "SMARTTOUR_MAX_NEIGHBORS")]
    max_neighbors: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("smarttour_server=info".parse()?)
                .add_directive("smarttour_core=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if args.port == 0 {
        eprintln!("Error: port must be > 0");
        std::process::exit(1);
    }
    if args.default_top_n == 0 || args.default_top_n > config::MAX_TOP_N {
        eprintln!("Error: default-top-n must be 1-{}", config::MAX_TOP_N);
        std::process::exit(1);
    }
    if args.data_dir.exists() && !args.data_dir.is_dir() {
        eprintln!(
            "Error: data_dir '{}' exists but is not a directory",
            args.data_dir.display()
        );
        std::process::exit(1);
    }

    let (catalog, load_stats, malformed) = loader::load_catalog(&args.catalog)?;
    if catalog.is_empty() {
        tracing::warn!("Catalog is empty; every recommendation list will be empty");
    }
    if load_stats.skipped() + malformed > 0 {
        tracing::warn!(
            missing_name = load_stats.missing_name,
            duplicate_id = load_stats.duplicate_id,
            malformed,
            "Catalog rows skipped"
        );
    }

    let (store, replay) = RatingStore::open(&args.data_dir)?;
    if replay.skipped > 0 || replay.crc_errors > 0 || replay.truncated {
        tracing::warn!(
            ok = replay.success,
            skipped = replay.skipped,
            crc_errors = replay.crc_errors,
            truncated = replay.truncated,
            "WAL replay encountered damaged entries"
        );
    }
    let store_was_empty = store.is_empty();

    let recommender = Arc::new(Recommender::new(
        catalog,
        store,
        RecommenderConfig {
            default_top_n: args.default_top_n,
            max_top_n: config::MAX_TOP_N,
            max_neighbors: args.max_neighbors,
        },
    ));

    if let Some(ref path) = args.import_ratings {
        if store_was_empty {
            let rows = loader::load_ratings(path)?;
            let stats = recommender.import_ratings(&rows.rows)?;
            tracing::info!(
                path = %path.display(),
                accepted = stats.accepted,
                skipped = stats.skipped + rows.malformed,
                "Ratings imported"
            );
        } else {
            tracing::info!(
                path = %path.display(),
                "Rating store already populated, import skipped"
            );
        }
    }

    let prometheus_handle =
        metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let state = AppState {
        recommender: recommender.clone(),
        prometheus_handle,
        start_time: Instant::now(),
    };
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", args.port);

    let stats = recommender.stats();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        data_dir = %args.data_dir.display(),
        snapshot_interval_secs = args.snapshot_interval,
        items = stats.items,
        ratings = stats.ratings,
        users = stats.users,
        "smarttour ready"
    );

    // Engine gauges
    let metrics_recommender = recommender.clone();
    let wal_path = args.data_dir.join(config::WAL_FILE_NAME);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(15));
        loop {
            interval.tick().await;
            metrics::update_engine_metrics(&metrics_recommender);
            metrics::update_wal_metrics(&wal_path);
        }
    });

    if args.snapshot_interval > 0 {
        let snap_recommender = recommender.clone();
        let snap_interval = args.snapshot_interval;
        tracing::info!("Auto-snapshots enabled every {}s", snap_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(snap_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                match snap_recommender.compact() {
                    Ok(ratings) => tracing::info!(ratings, "Periodic snapshot complete"),
                    Err(e) => tracing::error!(error = %e, "Periodic snapshot failed"),
                }
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    tracing::info!("All requests drained, writing final snapshot...");
    match recommender.compact() {
        Ok(ratings) => tracing::info!(ratings, "Final snapshot written, WAL truncated"),
        Err(e) => tracing::error!(error = %e, "Final snapshot failed, WAL preserved for recovery"),
    }

    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}
