//! Prometheus-compatible metrics endpoint
//!
//! Exposes simulation metrics in Prometheus format.
//! Default endpoint: http://localhost:9090/metrics

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::game::scheduler::StatusSnapshot;

/// Tick samples kept for percentiles
const HISTORY: usize = 1000;

/// Metrics registry for the simulation
#[derive(Debug)]
pub struct Metrics {
    // World
    pub population: AtomicU64,
    pub resources: AtomicU64,
    pub births: AtomicU64,
    pub deaths: AtomicU64,
    pub failed_moves: AtomicU64,
    pub pickups: AtomicU64,

    // Scheduler
    pub tick_count: AtomicU64,
    pub paused: AtomicU64,
    pub deferred_decisions: AtomicU64,
    pub decide_time_us: AtomicU64,
    pub commit_time_us: AtomicU64,

    // Tick timing (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,
    pub tick_time_p99_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,

    start_time: Instant,

    // Rolling tick times for percentile calculation
    tick_history: RwLock<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            population: AtomicU64::new(0),
            resources: AtomicU64::new(0),
            births: AtomicU64::new(0),
            deaths: AtomicU64::new(0),
            failed_moves: AtomicU64::new(0),
            pickups: AtomicU64::new(0),
            tick_count: AtomicU64::new(0),
            paused: AtomicU64::new(0),
            deferred_decisions: AtomicU64::new(0),
            decide_time_us: AtomicU64::new(0),
            commit_time_us: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            tick_time_p99_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(HISTORY)),
        }
    }

    /// Record a tick time and update percentiles
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;

            self.tick_time_p95_us.store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_p99_us.store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_max_us.store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    /// Publish a scheduler snapshot
    pub fn update(&self, snapshot: &StatusSnapshot) {
        let stats = &snapshot.statistics;
        self.population.store(stats.population as u64, Ordering::Relaxed);
        self.resources.store(stats.resources as u64, Ordering::Relaxed);
        self.births.store(stats.births, Ordering::Relaxed);
        self.deaths.store(stats.deaths, Ordering::Relaxed);
        self.failed_moves.store(stats.failed_moves, Ordering::Relaxed);
        self.pickups.store(stats.pickups, Ordering::Relaxed);

        self.tick_count.store(snapshot.tick, Ordering::Relaxed);
        self.paused.store(snapshot.paused as u64, Ordering::Relaxed);
        self.deferred_decisions
            .store(snapshot.diagnostics.deferred_decisions, Ordering::Relaxed);
        self.decide_time_us
            .store(snapshot.diagnostics.decide.last_us, Ordering::Relaxed);
        self.commit_time_us
            .store(snapshot.diagnostics.commit.last_us, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(4096);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        // World metrics
        metric!("gridlife_population", "Entities on the roster", "gauge",
            self.population.load(Ordering::Relaxed));
        metric!("gridlife_resources", "Resources on the grid", "gauge",
            self.resources.load(Ordering::Relaxed));
        metric!("gridlife_births_total", "Entities born", "counter",
            self.births.load(Ordering::Relaxed));
        metric!("gridlife_deaths_total", "Entities removed after decaying", "counter",
            self.deaths.load(Ordering::Relaxed));
        metric!("gridlife_failed_moves_total", "Moves lost to contention or the grid edge", "counter",
            self.failed_moves.load(Ordering::Relaxed));
        metric!("gridlife_pickups_total", "Resources picked up", "counter",
            self.pickups.load(Ordering::Relaxed));

        // Scheduler metrics
        metric!("gridlife_tick_count", "Total ticks processed", "counter",
            self.tick_count.load(Ordering::Relaxed));
        metric!("gridlife_paused", "Simulation paused (0/1)", "gauge",
            self.paused.load(Ordering::Relaxed));
        metric!("gridlife_deferred_decisions_total", "Decide tasks skipped by the deadline", "counter",
            self.deferred_decisions.load(Ordering::Relaxed));
        metric!("gridlife_decide_time_microseconds", "Last decide phase duration", "gauge",
            self.decide_time_us.load(Ordering::Relaxed));
        metric!("gridlife_commit_time_microseconds", "Last commit phase duration", "gauge",
            self.commit_time_us.load(Ordering::Relaxed));

        // Tick timing
        metric!("gridlife_tick_time_microseconds", "Current tick time in microseconds", "gauge",
            self.tick_time_us.load(Ordering::Relaxed));
        metric!("gridlife_tick_time_p95_microseconds", "95th percentile tick time", "gauge",
            self.tick_time_p95_us.load(Ordering::Relaxed));
        metric!("gridlife_tick_time_p99_microseconds", "99th percentile tick time", "gauge",
            self.tick_time_p99_us.load(Ordering::Relaxed));
        metric!("gridlife_tick_time_max_microseconds", "Maximum tick time", "gauge",
            self.tick_time_max_us.load(Ordering::Relaxed));

        metric!("gridlife_uptime_seconds", "Process uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// Generate JSON format metrics
    pub fn to_json(&self) -> String {
        let load = |value: &AtomicU64| value.load(Ordering::Relaxed);
        serde_json::json!({
            "world": {
                "population": load(&self.population),
                "resources": load(&self.resources),
                "births": load(&self.births),
                "deaths": load(&self.deaths),
                "failed_moves": load(&self.failed_moves),
                "pickups": load(&self.pickups),
            },
            "scheduler": {
                "tick_count": load(&self.tick_count),
                "paused": load(&self.paused) == 1,
                "deferred_decisions": load(&self.deferred_decisions),
                "decide_time_us": load(&self.decide_time_us),
                "commit_time_us": load(&self.commit_time_us),
            },
            "performance": {
                "tick_time_us": load(&self.tick_time_us),
                "tick_time_p95_us": load(&self.tick_time_p95_us),
                "tick_time_p99_us": load(&self.tick_time_p99_us),
                "tick_time_max_us": load(&self.tick_time_max_us),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn http_response(content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);

                    // Longest paths first: "/metrics" is a prefix of "/metrics/json"
                    let response = if request.starts_with("GET /metrics/json") || request.starts_with("GET /json") {
                        http_response("application/json", &metrics.to_json())
                    } else if request.starts_with("GET /metrics") {
                        http_response("text/plain; version=0.0.4", &metrics.to_prometheus())
                    } else if request.starts_with("GET /health") || request.starts_with("GET / ") {
                        http_response("text/plain", "OK")
                    } else {
                        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
                    };

                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::diagnostics::DiagnosticsSummary;
    use crate::game::state::Statistics;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.population.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.tick_count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_tick_time() {
        let metrics = Metrics::new();
        for i in 0..100 {
            metrics.record_tick_time(Duration::from_micros(100 + i * 10));
        }

        assert_eq!(metrics.tick_time_us.load(Ordering::Relaxed), 1090);
        assert!(metrics.tick_time_p95_us.load(Ordering::Relaxed) > 0);
        assert!(metrics.tick_time_p99_us.load(Ordering::Relaxed) > 0);
        assert_eq!(metrics.tick_time_max_us.load(Ordering::Relaxed), 1090);
    }

    #[test]
    fn test_update_from_snapshot() {
        let metrics = Metrics::new();
        let snapshot = StatusSnapshot {
            tick: 12,
            paused: true,
            statistics: Statistics {
                population: 40,
                births: 3,
                ..Statistics::default()
            },
            diagnostics: DiagnosticsSummary {
                deferred_decisions: 2,
                ..DiagnosticsSummary::default()
            },
            selected: None,
        };
        metrics.update(&snapshot);

        assert_eq!(metrics.tick_count.load(Ordering::Relaxed), 12);
        assert_eq!(metrics.population.load(Ordering::Relaxed), 40);
        assert_eq!(metrics.births.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.paused.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.deferred_decisions.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = Metrics::new();
        metrics.population.store(50, Ordering::Relaxed);
        metrics.deaths.store(5, Ordering::Relaxed);

        let output = metrics.to_prometheus();

        assert!(output.contains("gridlife_population 50"));
        assert!(output.contains("gridlife_deaths_total 5"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE gridlife_births_total counter"));
    }

    #[test]
    fn test_json_format() {
        let metrics = Metrics::new();
        metrics.population.store(100, Ordering::Relaxed);

        let value: serde_json::Value = serde_json::from_str(&metrics.to_json()).expect("valid json");
        assert_eq!(value["world"]["population"], 100);
        assert_eq!(value["scheduler"]["paused"], false);
        assert!(value["performance"].is_object());
    }
}
