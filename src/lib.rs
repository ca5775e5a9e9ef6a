//! Gridlife simulation core
//!
//! A tick-based simulation of foragers on a 2D tile grid.
//!
//! Each tick runs in two phases: entities decide in parallel against a
//! read-only world and queue their actions, then the queue is drained and
//! every action commits serially.
//!
//! # Features
//!
//! - `metrics_server` - Prometheus/JSON metrics endpoint in the binary (enabled by default)

pub mod config;
pub mod game;
pub mod metrics;
pub mod util;
