//! Phase timing for the tick scheduler
//!
//! Each phase (decide, commit, whole tick) gets a [`StopWatch`] that keeps a
//! rolling window of recent durations, similar to how frame timings are kept
//! for a status overlay.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept per stopwatch
pub const WINDOW: usize = 10;

/// Stopwatch with a rolling window of lap durations
#[derive(Debug, Clone)]
pub struct StopWatch {
    started: Option<Instant>,
    laps: VecDeque<Duration>,
    max_samples: usize,
    total_laps: u64,
}

impl Default for StopWatch {
    fn default() -> Self {
        Self::new(WINDOW)
    }
}

impl StopWatch {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            started: None,
            laps: VecDeque::with_capacity(max_samples),
            max_samples,
            total_laps: 0,
        }
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Stop and record the lap; `None` when the watch was not running
    pub fn stop(&mut self) -> Option<Duration> {
        let elapsed = self.started.take()?.elapsed();
        self.record(elapsed);
        Some(elapsed)
    }

    /// Record an externally measured duration
    pub fn record(&mut self, lap: Duration) {
        if self.laps.len() >= self.max_samples {
            self.laps.pop_front();
        }
        self.laps.push_back(lap);
        self.total_laps += 1;
    }

    pub fn last(&self) -> Duration {
        self.laps.back().copied().unwrap_or_default()
    }

    pub fn average(&self) -> Duration {
        if self.laps.is_empty() {
            return Duration::ZERO;
        }
        self.laps.iter().sum::<Duration>() / self.laps.len() as u32
    }

    /// 95th percentile of the window
    pub fn p95(&self) -> Duration {
        if self.laps.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<Duration> = self.laps.iter().copied().collect();
        sorted.sort_unstable();
        let index = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
        sorted[index]
    }

    pub fn total_laps(&self) -> u64 {
        self.total_laps
    }

    pub fn summary(&self) -> PhaseTiming {
        PhaseTiming {
            last_us: self.last().as_micros() as u64,
            average_us: self.average().as_micros() as u64,
            p95_us: self.p95().as_micros() as u64,
        }
    }
}

/// Serializable timing summary of one phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTiming {
    pub last_us: u64,
    pub average_us: u64,
    pub p95_us: u64,
}

/// Scheduler diagnostics
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub decide: StopWatch,
    pub commit: StopWatch,
    pub tick: StopWatch,
    started_at: Instant,
    /// Decide tasks skipped because the deadline passed before they started
    pub deferred_decisions: u64,
    /// Actions run during commit, all ticks
    pub actions_committed: u64,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            decide: StopWatch::default(),
            commit: StopWatch::default(),
            tick: StopWatch::default(),
            started_at: Instant::now(),
            deferred_decisions: 0,
            actions_committed: 0,
        }
    }

    /// Wall-clock time since the scheduler was created
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn summary(&self) -> DiagnosticsSummary {
        DiagnosticsSummary {
            decide: self.decide.summary(),
            commit: self.commit.summary(),
            tick: self.tick.summary(),
            elapsed_ms: self.elapsed().as_millis() as u64,
            deferred_decisions: self.deferred_decisions,
            actions_committed: self.actions_committed,
        }
    }
}

/// Serializable view of [`Diagnostics`]
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DiagnosticsSummary {
    pub decide: PhaseTiming,
    pub commit: PhaseTiming,
    pub tick: PhaseTiming,
    pub elapsed_ms: u64,
    pub deferred_decisions: u64,
    pub actions_committed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_window() {
        let mut watch = StopWatch::new(3);
        for ms in [10, 20, 30, 40] {
            watch.record(Duration::from_millis(ms));
        }
        assert_eq!(watch.total_laps(), 4);
        assert_eq!(watch.last(), Duration::from_millis(40));
        // Oldest sample (10ms) was evicted
        assert_eq!(watch.average(), Duration::from_millis(30));
        assert_eq!(watch.p95(), Duration::from_millis(40));
    }

    #[test]
    fn test_stopwatch_start_stop() {
        let mut watch = StopWatch::default();
        assert!(watch.stop().is_none());
        watch.start();
        std::thread::sleep(Duration::from_millis(2));
        let lap = watch.stop();
        assert!(lap.is_some_and(|d| d >= Duration::from_millis(2)));
        assert_eq!(watch.total_laps(), 1);
    }

    #[test]
    fn test_empty_stopwatch() {
        let watch = StopWatch::default();
        assert_eq!(watch.average(), Duration::ZERO);
        assert_eq!(watch.p95(), Duration::ZERO);
        assert_eq!(watch.summary(), PhaseTiming::default());
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.tick.record(Duration::from_micros(1500));
        diagnostics.deferred_decisions = 3;
        let summary = diagnostics.summary();
        assert_eq!(summary.tick.last_us, 1500);
        assert_eq!(summary.deferred_decisions, 3);
    }
}
