//! `stock-dash` library crate.
//!
//! The binary (`sd`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes or touching the network
//! - the pipeline can be driven by any `MarketDataSource`
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod chart;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod session;
pub mod stats;
pub mod tui;
