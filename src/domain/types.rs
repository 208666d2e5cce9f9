//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed through the pipeline by value within one run
//! - exported to CSV/JSON
//! - shown in the TUI without further conversion

use std::fmt;
use std::time::Duration;

use chrono::{Days, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const DEFAULT_TICKER: &str = "AAPL";
pub const DEFAULT_MA_WINDOWS: [usize; 2] = [20, 50];
pub const DEFAULT_LOOKBACK_DAYS: u64 = 365;
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Longest ticker we accept (e.g. `BRK-B`, `^GSPC`, `EURUSD=X` all fit easily).
pub const MAX_TICKER_LEN: usize = 15;

/// Numeric columns of an OHLCV series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::Open => self.open,
            Column::High => self.high,
            Column::Low => self.low,
            Column::Close => self.close,
            Column::Volume => self.volume as f64,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
    }

    /// `low <= min(open, close)` and `max(open, close) <= high`.
    pub fn is_consistent(&self) -> bool {
        self.low <= self.open.min(self.close) && self.open.max(self.close) <= self.high
    }
}

/// Daily OHLCV history of one ticker.
///
/// Bars are ordered by date, strictly ascending (see `data::normalize_bars`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn column(&self, column: Column) -> Vec<f64> {
        self.bars.iter().map(|b| b.value(column)).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.column(Column::Close)
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.bars.first()?.date, self.bars.last()?.date))
    }
}

/// What the user asked for: ticker and inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSelection {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl UserSelection {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }

    /// Default ticker over the last year ending `today`.
    pub fn default_for(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
            .unwrap_or(today);
        Self::new(DEFAULT_TICKER, start, today)
    }

    /// Validate and normalize the selection.
    ///
    /// - ticker is trimmed and upper-cased
    /// - an `end` past `today` is clamped to `today`
    pub fn validate(&self, today: NaiveDate) -> Result<UserSelection, PipelineError> {
        let ticker = normalize_ticker(&self.ticker)?;

        if self.start > self.end {
            return Err(PipelineError::invalid(format!(
                "start date {} is after end date {}",
                self.start, self.end
            )));
        }
        if self.start > today {
            return Err(PipelineError::invalid(format!(
                "start date {} is in the future (today is {today})",
                self.start
            )));
        }

        Ok(UserSelection {
            ticker,
            start: self.start,
            end: self.end.min(today),
        })
    }
}

/// Quick date ranges counted back from the selection's end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    /// Everything Yahoo has, from the Unix epoch on.
    Max,
}

impl RangePreset {
    pub fn start_for(self, end: NaiveDate) -> NaiveDate {
        let months = match self {
            RangePreset::OneMonth => 1,
            RangePreset::ThreeMonths => 3,
            RangePreset::SixMonths => 6,
            RangePreset::OneYear => 12,
            RangePreset::Max => return NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(end).min(end),
        };
        end.checked_sub_months(Months::new(months)).unwrap_or(end)
    }
}

impl UserSelection {
    /// Same ticker and end date, start moved back by `preset`.
    pub fn with_preset(&self, preset: RangePreset) -> UserSelection {
        UserSelection {
            start: preset.start_for(self.end),
            ..self.clone()
        }
    }
}

impl fmt::Display for UserSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}..{}", self.ticker, self.start, self.end)
    }
}

fn normalize_ticker(raw: &str) -> Result<String, PipelineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::invalid("ticker symbol is empty"));
    }
    if trimmed.len() > MAX_TICKER_LEN {
        return Err(PipelineError::invalid(format!(
            "ticker '{trimmed}' is longer than {MAX_TICKER_LEN} characters"
        )));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return Err(PipelineError::invalid(format!(
            "ticker '{trimmed}' contains invalid character '{bad}'"
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Check a list of moving-average windows.
pub fn validate_windows(windows: &[usize]) -> Result<(), PipelineError> {
    if windows.iter().any(|&w| w == 0) {
        return Err(PipelineError::invalid("moving-average window must be at least 1"));
    }
    Ok(())
}

/// Parse `"20, 50"` style window lists (as typed in the TUI sidebar).
pub fn parse_windows(raw: &str) -> Result<Vec<usize>, PipelineError> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let w = part
            .parse::<usize>()
            .map_err(|e| PipelineError::invalid(format!("invalid window '{part}': {e}")))?;
        out.push(w);
    }
    validate_windows(&out)?;
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

/// HTTP behaviour of the market data client.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub base_url: String,
    /// `None` leaves the HTTP client's default in place.
    pub timeout: Option<Duration>,
    /// Extra attempts after the first one (0 = single attempt).
    pub retries: u32,
    pub retry_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(Duration::from_secs(30)),
            retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Resolved run configuration (CLI args + environment).
#[derive(Debug, Clone, PartialEq)]
pub struct DashConfig {
    pub selection: UserSelection,
    pub ma_windows: Vec<usize>,
    pub fetch: FetchConfig,
}

impl DashConfig {
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            selection: UserSelection::default_for(today),
            ma_windows: DEFAULT_MA_WINDOWS.to_vec(),
            fetch: FetchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn validate_normalizes_ticker_and_clamps_end() {
        let today = d(2024, 6, 10);
        let sel = UserSelection::new("  brk-b ", d(2024, 1, 1), d(2024, 12, 31));
        let out = sel.validate(today).unwrap();
        assert_eq!(out.ticker, "BRK-B");
        assert_eq!(out.end, today);
        assert_eq!(out.start, d(2024, 1, 1));
    }

    #[test]
    fn validate_rejects_bad_inputs() {
        let today = d(2024, 6, 10);
        let cases = [
            UserSelection::new("", d(2024, 1, 1), d(2024, 2, 1)),
            UserSelection::new("AA PL", d(2024, 1, 1), d(2024, 2, 1)),
            UserSelection::new("A".repeat(16), d(2024, 1, 1), d(2024, 2, 1)),
            UserSelection::new("AAPL", d(2024, 2, 1), d(2024, 1, 1)),
            UserSelection::new("AAPL", d(2024, 7, 1), d(2024, 8, 1)),
        ];
        for sel in cases {
            assert!(
                matches!(sel.validate(today), Err(PipelineError::InvalidInput(_))),
                "expected invalid input for {sel:?}"
            );
        }
    }

    #[test]
    fn index_style_tickers_are_accepted() {
        let today = d(2024, 6, 10);
        for t in ["^GSPC", "EURUSD=X", "BF.B"] {
            assert!(UserSelection::new(t, d(2024, 1, 1), d(2024, 2, 1)).validate(today).is_ok());
        }
    }

    #[test]
    fn parse_windows_sorts_and_rejects_zero() {
        assert_eq!(parse_windows("50, 20,20").unwrap(), vec![20, 50]);
        assert_eq!(parse_windows("").unwrap(), Vec::<usize>::new());
        assert!(parse_windows("0").is_err());
        assert!(parse_windows("ten").is_err());
    }

    #[test]
    fn presets_count_back_from_the_end_date() {
        let sel = UserSelection::new("AAPL", d(2024, 1, 1), d(2024, 5, 31));
        assert_eq!(sel.with_preset(RangePreset::OneMonth).start, d(2024, 4, 30));
        assert_eq!(sel.with_preset(RangePreset::ThreeMonths).start, d(2024, 2, 29));
        assert_eq!(sel.with_preset(RangePreset::SixMonths).start, d(2023, 11, 30));
        assert_eq!(sel.with_preset(RangePreset::OneYear).start, d(2023, 5, 31));
        assert_eq!(sel.with_preset(RangePreset::Max).start, d(1970, 1, 1));

        let moved = sel.with_preset(RangePreset::ThreeMonths);
        assert_eq!((moved.ticker.as_str(), moved.end), ("AAPL", d(2024, 5, 31)));
    }
}
