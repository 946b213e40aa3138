// Unilog - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library plus pure data crates (chrono, regex, serde).
// Must NOT depend on: platform, app, or process-level state.

pub mod discovery;
pub mod filter;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod render;
pub mod segment;
pub mod timestamp;
