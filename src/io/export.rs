//! Export a pipeline run: prices CSV, statistics JSON and chart SVGs.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::app::pipeline::RunOutput;
use crate::chart::svg::write_chart_svgs;
use crate::domain::Column;
use crate::error::AppError;
use crate::stats::{CorrelationMatrix, Decomposition, DerivedStatistics};

/// Bump when the JSON layout changes.
pub const STATS_SCHEMA_VERSION: u32 = 2;

/// Per-day prices with the daily return and one column per moving average.
///
/// Undefined values (first return, MA warm-up) are written as empty fields.
pub fn prices_csv(run: &RunOutput) -> Result<String, AppError> {
    let fail = |e: csv::Error| AppError::runtime(format!("Failed to write prices CSV: {e}"));
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = ["date", "open", "high", "low", "close", "volume", "daily_return"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(run.stats.moving_averages.iter().map(|ma| ma.label().to_lowercase()));
    wtr.write_record(&header).map_err(fail)?;

    for (i, bar) in run.series.bars.iter().enumerate() {
        let mut record = vec![
            bar.date.to_string(),
            format!("{:.6}", bar.open),
            format!("{:.6}", bar.high),
            format!("{:.6}", bar.low),
            format!("{:.6}", bar.close),
            bar.volume.to_string(),
            opt(run.stats.daily_returns.get(i).copied().flatten(), 8),
        ];
        for ma in &run.stats.moving_averages {
            record.push(opt(ma.values.get(i).copied().flatten(), 6));
        }
        wtr.write_record(&record).map_err(fail)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| AppError::runtime(format!("Failed to flush prices CSV: {e}")))?;
    String::from_utf8(data).map_err(|e| AppError::runtime(format!("Prices CSV is not valid UTF-8: {e}")))
}

fn opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{v:.decimals$}")).unwrap_or_default()
}

/// Serializable view of a correlation matrix.
#[derive(Debug, Serialize)]
pub struct CorrelationExport {
    pub columns: Vec<Column>,
    pub excluded: Vec<Column>,
    pub matrix: Vec<Vec<f64>>,
}

impl From<&CorrelationMatrix> for CorrelationExport {
    fn from(m: &CorrelationMatrix) -> Self {
        Self {
            columns: m.columns().to_vec(),
            excluded: m.excluded().to_vec(),
            matrix: m.rows(),
        }
    }
}

/// Serializable view of a seasonal decomposition.
#[derive(Debug, Serialize)]
pub struct DecompositionExport<'a> {
    pub period: usize,
    pub seasonal_pattern: &'a [f64],
    pub trend: &'a [Option<f64>],
    pub residual: &'a [Option<f64>],
}

impl<'a> From<&'a Decomposition> for DecompositionExport<'a> {
    fn from(d: &'a Decomposition) -> Self {
        Self {
            period: d.period,
            seasonal_pattern: &d.seasonal_pattern,
            trend: &d.trend,
            residual: &d.residual,
        }
    }
}

/// JSON document written to `<TICKER>_stats.json`.
#[derive(Debug, Serialize)]
pub struct StatsExport<'a> {
    pub schema_version: u32,
    pub ticker: &'a str,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub trading_days: usize,
    pub statistics: &'a DerivedStatistics,
    pub correlation: Option<CorrelationExport>,
    /// Why `correlation` is missing, if it is.
    pub correlation_error: Option<String>,
    pub decomposition: Option<DecompositionExport<'a>>,
    pub decomposition_error: Option<String>,
}

impl<'a> StatsExport<'a> {
    pub fn from_run(run: &'a RunOutput) -> Self {
        let (correlation, correlation_error) = match &run.correlation {
            Ok(m) => (Some(CorrelationExport::from(m)), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let (decomposition, decomposition_error) = match &run.decomposition {
            Ok(d) => (Some(DecompositionExport::from(d)), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            schema_version: STATS_SCHEMA_VERSION,
            ticker: &run.selection.ticker,
            start: run.selection.start,
            end: run.selection.end,
            trading_days: run.series.len(),
            statistics: &run.stats,
            correlation,
            correlation_error,
            decomposition,
            decomposition_error,
        }
    }
}

pub fn stats_json(run: &RunOutput) -> Result<String, AppError> {
    serde_json::to_string_pretty(&StatsExport::from_run(run))
        .map_err(|e| AppError::runtime(format!("Failed to serialize statistics JSON: {e}")))
}

/// Write the full export set for a run into `dir` (created if missing).
///
/// Files:
/// - `<TICKER>_prices.csv`
/// - `<TICKER>_stats.json`
/// - `<TICKER>_line.svg`, `<TICKER>_candlestick.svg`, `<TICKER>_correlation.svg`
///
/// Returns every path written.
pub fn export_run(dir: &Path, run: &RunOutput) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::runtime(format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let ticker = file_stem(&run.selection.ticker);
    let mut written = Vec::new();

    let csv_path = dir.join(format!("{ticker}_prices.csv"));
    write_text(&csv_path, &prices_csv(run)?)?;
    written.push(csv_path);

    let json_path = dir.join(format!("{ticker}_stats.json"));
    write_text(&json_path, &stats_json(run)?)?;
    written.push(json_path);

    written.extend(write_chart_svgs(dir, &ticker, &run.charts)?);

    info!(count = written.len(), dir = %dir.display(), "export complete");
    Ok(written)
}

/// Tickers like `^GSPC` are valid symbols but awkward file names.
fn file_stem(ticker: &str) -> String {
    ticker
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

fn write_text(path: &Path, contents: &str) -> Result<(), AppError> {
    fs::write(path, contents)
        .map_err(|e| AppError::runtime(format!("Failed to write '{}': {e}", path.display())))
}
