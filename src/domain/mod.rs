//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - price data (`Bar`, `PriceSeries`, `Column`)
//! - the user's selection (`UserSelection`) and its validation
//! - resolved configuration (`DashConfig`, `FetchConfig`)

pub mod types;

pub use types::*;
