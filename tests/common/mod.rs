//! Shared helpers for integration tests: in-memory market data sources.

#![allow(dead_code)]

use std::cell::Cell;

use chrono::NaiveDate;
use stock_dash::data::{MarketDataSource, parse_chart_response};
use stock_dash::domain::{Bar, UserSelection};
use stock_dash::error::PipelineError;

pub const AAPL_FIXTURE: &str = include_str!("../fixtures/aapl_2023-01-01_2023-01-10.json");
pub const NOT_FOUND_FIXTURE: &str = include_str!("../fixtures/not_found.json");

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Replays a recorded Yahoo chart response and counts calls.
pub struct RecordedSource {
    body: &'static str,
    calls: Cell<usize>,
}

impl RecordedSource {
    pub fn new(body: &'static str) -> Self {
        Self {
            body,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl MarketDataSource for RecordedSource {
    fn name(&self) -> &str {
        "recorded"
    }

    fn fetch_daily(&self, _selection: &UserSelection) -> Result<Vec<Bar>, PipelineError> {
        self.calls.set(self.calls.get() + 1);
        parse_chart_response(self.body)
    }
}

/// Returns a fixed list of bars (in whatever order it was given).
pub struct VecSource {
    pub bars: Vec<Bar>,
}

impl MarketDataSource for VecSource {
    fn name(&self) -> &str {
        "vec"
    }

    fn fetch_daily(&self, _selection: &UserSelection) -> Result<Vec<Bar>, PipelineError> {
        Ok(self.bars.clone())
    }
}

/// Always fails like a dropped connection.
pub struct OfflineSource;

impl MarketDataSource for OfflineSource {
    fn name(&self) -> &str {
        "offline"
    }

    fn fetch_daily(&self, _selection: &UserSelection) -> Result<Vec<Bar>, PipelineError> {
        Err(PipelineError::unavailable("connection refused"))
    }
}

pub fn aapl_selection() -> UserSelection {
    UserSelection::new("AAPL", d(2023, 1, 1), d(2023, 1, 10))
}

pub fn today() -> NaiveDate {
    d(2024, 1, 2)
}
