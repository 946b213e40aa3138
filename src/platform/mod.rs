// Unilog - platform/mod.rs
//
// Platform abstraction layer: filesystem reads and config file resolution.
// Dependencies: standard library, directories, memmap2, toml, core types.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
