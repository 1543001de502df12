//! HTTP server for the `openbracket` tournament engine.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
