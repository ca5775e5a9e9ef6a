pub mod action_queue;
pub mod bucketed;
pub mod constants;
pub mod dense;
pub mod diagnostics;
pub mod entity;
pub mod grid;
pub mod scheduler;
pub mod search;
pub mod state;
pub mod systems;
pub mod tile;
