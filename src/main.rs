use std::sync::Arc;
use std::time::Instant;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gridlife::config::{GridKind, SimConfig};
use gridlife::game::bucketed::BucketedGrid;
use gridlife::game::dense::DenseGrid;
use gridlife::game::grid::TileGrid;
use gridlife::game::scheduler::Scheduler;
use gridlife::game::search::{PartitionSearch, Search, SpiralSearch};
use gridlife::game::systems::Forager;
use gridlife::metrics::Metrics;

/// Ticks between progress log lines
const LOG_EVERY: u64 = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Gridlife v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = SimConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: {}x{}, population={}/{}, food={}, grid={:?}, order={:?}",
        config.width,
        config.height,
        config.initial_population,
        config.max_population,
        config.initial_food,
        config.grid,
        config.commit_order
    );

    let metrics = Arc::new(Metrics::new());

    #[cfg(feature = "metrics_server")]
    {
        // Port 9090 unless METRICS_PORT says otherwise
        let metrics_port: u16 = std::env::var("METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9090);

        let metrics_clone = metrics.clone();
        tokio::spawn(async move {
            let server = gridlife::metrics::start_metrics_server(metrics_clone, metrics_port);
            if let Err(e) = server.await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let simulation = async {
        match config.grid {
            GridKind::Dense => {
                let grid = DenseGrid::new(config.width, config.height);
                let scheduler = Scheduler::populated(&config, grid, SpiralSearch::new(), Forager);
                run(&config, scheduler, &metrics).await
            }
            GridKind::Bucketed => {
                let grid = BucketedGrid::new(
                    config.width,
                    config.height,
                    config.bucket_width,
                    config.bucket_height,
                );
                let scheduler =
                    Scheduler::populated(&config, grid, PartitionSearch::new(), Forager);
                run(&config, scheduler, &metrics).await
            }
        }
    };

    tokio::select! {
        result = simulation => {
            if let Err(e) = result {
                error!("Simulation error: {}", e);
                return Err(e);
            }
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received");
        }
    }

    info!("Simulation stopped");
    Ok(())
}

/// Tick until `max_ticks` is reached or the population dies out
async fn run<G: TileGrid, S: Search<G>>(
    config: &SimConfig,
    mut scheduler: Scheduler<G, S, Forager>,
    metrics: &Metrics,
) -> anyhow::Result<()> {
    let mut ticker = config.min_tick_duration.map(|duration| {
        let mut ticker = interval(duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    info!(
        "Simulation started with {} entities and {} resources",
        scheduler.world().roster().len(),
        scheduler.world().grid().resource_count()
    );

    loop {
        match ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => tokio::task::yield_now().await,
        }

        let started = Instant::now();
        let advanced = tokio::task::block_in_place(|| scheduler.tick());
        metrics.record_tick_time(started.elapsed());

        let snapshot = scheduler.snapshot();
        metrics.update(&snapshot);

        if snapshot.tick % LOG_EVERY == 0 && advanced {
            info!(
                "Tick {}: population={}, resources={}, births={}, deaths={} | decide {}us, commit {}us",
                snapshot.tick,
                snapshot.statistics.population,
                snapshot.statistics.resources,
                snapshot.statistics.births,
                snapshot.statistics.deaths,
                snapshot.diagnostics.decide.average_us,
                snapshot.diagnostics.commit.average_us
            );
        }

        let finished = config.max_ticks.is_some_and(|max| snapshot.tick >= max);
        if finished || (!advanced && !scheduler.is_paused()) {
            info!("Final status: {}", serde_json::to_string(&snapshot)?);
            return Ok(());
        }
    }
}
