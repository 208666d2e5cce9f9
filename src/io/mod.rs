//! Input/output helpers.
//!
//! - run exports: prices CSV, statistics JSON, chart SVGs (`export`)

pub mod export;

pub use export::*;
