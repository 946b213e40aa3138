// Unilog - lib.rs
//
// Library entry point, exposing every layer for integration testing and for
// callers that drive the merge with their own source enumeration.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
