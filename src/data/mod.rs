//! Market data retrieval.
//!
//! `fetch` is the only entry point the pipeline uses. It validates the
//! selection *before* touching the source, then normalizes whatever the source
//! returned so that downstream code can rely on:
//!
//! - every bar dated within `[start, end]`
//! - dates strictly ascending, no duplicates
//! - finite OHLC values with `low <= open, close <= high`

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{Bar, PriceSeries, UserSelection};
use crate::error::PipelineError;

pub mod yahoo;

pub use yahoo::{YahooClient, parse_chart_response};

/// A source of daily OHLCV bars.
///
/// Implementations receive an already validated selection and may return bars
/// in any order; `fetch` takes care of normalization.
pub trait MarketDataSource {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Retrieve daily bars for the selection. An empty vector means "no data".
    fn fetch_daily(&self, selection: &UserSelection) -> Result<Vec<Bar>, PipelineError>;
}

/// Validate the selection and fetch its daily series from `source`.
pub fn fetch<S>(source: &S, selection: &UserSelection, today: NaiveDate) -> Result<PriceSeries, PipelineError>
where
    S: MarketDataSource + ?Sized,
{
    let selection = selection.validate(today)?;
    info!(source = source.name(), %selection, "fetching daily bars");

    let raw = source.fetch_daily(&selection)?;
    let raw_len = raw.len();
    let bars = normalize_bars(raw, selection.start, selection.end);
    debug!(raw = raw_len, kept = bars.len(), "normalized bars");

    Ok(PriceSeries::new(selection.ticker, bars))
}

/// Drop out-of-range, non-finite and inconsistent bars, sort by date, and
/// collapse duplicate dates (the later bar wins).
pub fn normalize_bars(mut bars: Vec<Bar>, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    bars.retain(|b| b.date >= start && b.date <= end && b.is_finite() && b.is_consistent());
    // Stable sort keeps source order among equal dates, so "last wins" below
    // means "last reported wins".
    bars.sort_by_key(|b| b.date);

    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => out.push(bar),
        }
    }
    out
}
