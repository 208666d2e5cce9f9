//! Formatted terminal output: run summary, statistics table, correlation table,
//! seasonal decomposition.
//!
//! We keep formatting code in one place so:
//! - the statistics code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::RunOutput;
use crate::domain::Column;
use crate::error::PipelineError;
use crate::stats::{ColumnSummary, CorrelationMatrix, Decomposition, DerivedStatistics, Statistic};

const LABEL_WIDTH: usize = 8;
const CELL_WIDTH: usize = 14;

/// Header of the daily-return column.
pub const RETURN_HEADER: &str = "return";

/// Header block: selection, coverage and the latest values.
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== sd - Stock Dashboard ===\n");
    out.push_str(&format!("Ticker: {}\n", run.selection.ticker));
    out.push_str(&format!(
        "Requested: {} .. {}\n",
        run.selection.start, run.selection.end
    ));
    if let Some((first, last)) = run.series.date_range() {
        out.push_str(&format!(
            "Trading days: {} ({first} .. {last})\n",
            run.series.len()
        ));
    }
    if let Some(bar) = run.series.bars.last() {
        out.push_str(&format!("Last close: {:.2}\n", bar.close));
    }
    for ma in &run.stats.moving_averages {
        let latest = ma
            .latest()
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| format!("n/a (needs {} days)", ma.window));
        out.push_str(&format!("{}: {latest}\n", ma.label()));
    }

    out
}

/// Columns of the statistics table: OHLCV plus daily returns when defined.
pub fn stats_columns(stats: &DerivedStatistics) -> Vec<(&'static str, Option<&ColumnSummary>)> {
    let mut columns: Vec<(&'static str, Option<&ColumnSummary>)> = Column::ALL
        .iter()
        .map(|c| (c.display_name(), stats.columns.get(c)))
        .collect();
    if let Some(returns) = &stats.returns {
        columns.push((RETURN_HEADER, Some(returns)));
    }
    columns
}

/// One table cell; counts are integers, returns get more decimals.
pub fn stat_cell(summary: Option<&ColumnSummary>, stat: Statistic, header: &str) -> String {
    match summary.and_then(|s| s.get(stat)) {
        None => "-".to_string(),
        Some(v) if stat == Statistic::Count => format!("{v:.0}"),
        Some(v) if header == RETURN_HEADER => format!("{v:.4}"),
        Some(v) => format!("{v:.2}"),
    }
}

/// Statistic rows by column, plus a daily-return column when defined.
pub fn format_stats_table(stats: &DerivedStatistics) -> String {
    let columns = stats_columns(stats);

    let mut out = String::new();
    out.push_str(&format!("{:<LABEL_WIDTH$}", ""));
    for (header, _) in &columns {
        out.push_str(&format!(" {header:>CELL_WIDTH$}"));
    }
    out.push('\n');
    out.push_str(&rule(columns.len()));

    for stat in Statistic::ALL {
        out.push_str(&format!("{:<LABEL_WIDTH$}", stat.display_name()));
        for &(header, summary) in &columns {
            let cell = stat_cell(summary, stat, header);
            out.push_str(&format!(" {cell:>CELL_WIDTH$}"));
        }
        out.push('\n');
    }

    out
}

/// Correlation matrix as a labelled grid, or the reason it is undefined.
pub fn format_correlation_table(correlation: &Result<CorrelationMatrix, PipelineError>) -> String {
    let matrix = match correlation {
        Ok(m) => m,
        Err(err) => return format!("Correlation unavailable: {err}\n"),
    };

    let mut out = String::new();
    out.push_str(&format!("{:<LABEL_WIDTH$}", ""));
    for c in matrix.columns() {
        out.push_str(&format!(" {:>CELL_WIDTH$}", c.display_name()));
    }
    out.push('\n');
    out.push_str(&rule(matrix.size()));

    for (row, values) in matrix.rows().iter().enumerate() {
        out.push_str(&format!("{:<LABEL_WIDTH$}", matrix.columns()[row].display_name()));
        for v in values {
            out.push_str(&format!(" {v:>CELL_WIDTH$.2}"));
        }
        out.push('\n');
    }

    if !matrix.excluded().is_empty() {
        let names: Vec<&str> = matrix.excluded().iter().map(|c| c.display_name()).collect();
        out.push_str(&format!("(constant, excluded: {})\n", names.join(", ")));
    }

    out
}

/// Weekly pattern of the close series, or why it is undefined.
pub fn format_decomposition(decomposition: &Result<Decomposition, PipelineError>) -> String {
    let d = match decomposition {
        Ok(d) => d,
        Err(err) => return format!("Decomposition unavailable: {err}\n"),
    };

    let mut out = format!("Decomposition (additive, period {})\n", d.period);
    out.push_str(&format!("{:<LABEL_WIDTH$}", "phase"));
    for phase in 0..d.period {
        out.push_str(&format!(" {phase:>CELL_WIDTH$}"));
    }
    out.push('\n');
    out.push_str(&rule(d.period));
    out.push_str(&format!("{:<LABEL_WIDTH$}", "seasonal"));
    for v in &d.seasonal_pattern {
        out.push_str(&format!(" {v:>CELL_WIDTH$.4}"));
    }
    out.push('\n');

    if let Some(trend) = d.latest_trend() {
        out.push_str(&format!("Latest trend: {trend:.2}\n"));
    }
    if let Some(std) = d.residual_std() {
        out.push_str(&format!("Residual std: {std:.4}\n"));
    }
    out
}

fn rule(cells: usize) -> String {
    let width = LABEL_WIDTH + cells * (CELL_WIDTH + 1);
    format!("{}\n", "-".repeat(width))
}
