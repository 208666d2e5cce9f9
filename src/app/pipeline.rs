//! Shared dashboard pipeline used by the CLI commands and the TUI session.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate -> fetch -> describe -> correlate/decompose -> render charts
//!
//! The pipeline is a plain function of its inputs (source, selection, windows,
//! today's date), so it can be exercised with a fake `MarketDataSource`.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::chart::{ChartArtifacts, render_all};
use crate::data::{MarketDataSource, YahooClient, fetch};
use crate::domain::{DashConfig, PriceSeries, UserSelection, validate_windows};
use crate::error::{AppError, PipelineError};
use crate::stats::{CorrelationMatrix, Decomposition, DerivedStatistics, TRADING_WEEK, correlate, decompose, describe};

/// All computed outputs of a single pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The validated selection this run was computed for.
    pub selection: UserSelection,
    pub ma_windows: Vec<usize>,
    pub series: PriceSeries,
    pub stats: DerivedStatistics,
    /// Kept as a per-stage result: only the heatmap area degrades when it fails.
    pub correlation: Result<CorrelationMatrix, PipelineError>,
    /// Weekly seasonal decomposition of closes; short ranges leave it undefined.
    pub decomposition: Result<Decomposition, PipelineError>,
    pub charts: ChartArtifacts,
}

/// Execute the full pipeline against `source`.
///
/// Validation failures happen before the source is called. An empty series is
/// reported as `DataUnavailable` (there is nothing to display).
pub fn run_pipeline<S>(
    source: &S,
    selection: &UserSelection,
    ma_windows: &[usize],
    today: NaiveDate,
) -> Result<RunOutput, PipelineError>
where
    S: MarketDataSource + ?Sized,
{
    // 1) Validate everything user-supplied.
    let selection = selection.validate(today)?;
    validate_windows(ma_windows)?;

    // 2) Fetch.
    let series = fetch(source, &selection, today)?;
    if series.is_empty() {
        return Err(PipelineError::unavailable(format!(
            "No trading data for {} between {} and {}.",
            selection.ticker, selection.start, selection.end
        )));
    }

    // 3) Derive statistics and correlation.
    let stats = describe(&series, ma_windows)?;
    let correlation = correlate(&series);
    if let Err(err) = &correlation {
        warn!(%err, "correlation unavailable");
    }
    let decomposition = decompose(&series.closes(), TRADING_WEEK);
    if let Err(err) = &decomposition {
        debug!(%err, "decomposition unavailable");
    }

    // 4) Render chart artifacts.
    let charts = render_all(&series, &stats, &correlation);

    info!(%selection, bars = series.len(), "pipeline run complete");
    Ok(RunOutput {
        selection,
        ma_windows: ma_windows.to_vec(),
        series,
        stats,
        correlation,
        decomposition,
        charts,
    })
}

/// One-shot run for the non-interactive commands: Yahoo client from config,
/// today's local date.
pub fn run_once(config: &DashConfig) -> Result<RunOutput, AppError> {
    let client = YahooClient::new(config.fetch.clone())?;
    let today = Local::now().date_naive();
    Ok(run_pipeline(&client, &config.selection, &config.ma_windows, today)?)
}
