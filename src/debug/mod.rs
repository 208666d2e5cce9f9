//! Debug bundle writer for inspecting a dashboard run.
//!
//! The bundle is a single markdown file with the selection, raw bars,
//! derived statistics, correlation, decomposition and the last error (if any).

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::error::{AppError, PipelineError};
use crate::report::{format_correlation_table, format_decomposition, format_stats_table};

/// Default directory for bundles (relative to the working directory).
pub const DEBUG_DIR: &str = "debug";

/// Render the markdown body of a bundle.
pub fn format_debug_bundle(run: &RunOutput, last_error: Option<&PipelineError>) -> String {
    let mut out = String::new();

    out.push_str("# sd debug bundle\n");
    out.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    out.push_str(&format!("- selection: {}\n", run.selection));
    out.push_str(&format!("- ma_windows: {:?}\n", run.ma_windows));
    out.push_str(&format!("- trading_days: {}\n", run.series.len()));
    match last_error {
        Some(err) => out.push_str(&format!("- last_error: [{}] {err}\n", err.kind_label())),
        None => out.push_str("- last_error: none\n"),
    }

    out.push_str("\n## Bars\n");
    out.push_str("| date | open | high | low | close | volume | return |\n");
    out.push_str("| - | - | - | - | - | - | - |\n");
    for (i, b) in run.series.bars.iter().enumerate() {
        let ret = run.stats.daily_returns.get(i).copied().flatten();
        out.push_str(&format!(
            "| {} | {:.4} | {:.4} | {:.4} | {:.4} | {} | {} |\n",
            b.date,
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume,
            fmt_opt(ret)
        ));
    }

    out.push_str("\n## Statistics\n```text\n");
    out.push_str(&format_stats_table(&run.stats));
    out.push_str("```\n");

    out.push_str("\n## Moving averages (latest)\n");
    for ma in &run.stats.moving_averages {
        out.push_str(&format!(
            "- {}: {} ({} defined)\n",
            ma.label(),
            fmt_opt(ma.latest()),
            ma.defined().count()
        ));
    }

    out.push_str("\n## Correlation\n```text\n");
    out.push_str(&format_correlation_table(&run.correlation));
    out.push_str("```\n");

    out.push_str("\n## Decomposition\n```text\n");
    out.push_str(&format_decomposition(&run.decomposition));
    out.push_str("```\n");

    out
}

/// Write a bundle for `run` into `dir`; returns the file path.
pub fn write_debug_bundle(
    dir: &Path,
    run: &RunOutput,
    last_error: Option<&PipelineError>,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("sd_debug_{}_{ts}.md", run.selection.ticker.replace('^', "_")));

    let mut file =
        File::create(&path).map_err(|e| AppError::runtime(format!("Failed to create debug file: {e}")))?;
    file.write_all(format_debug_bundle(run, last_error).as_bytes())
        .map_err(|e| AppError::runtime(format!("Failed to write debug: {e}")))?;

    Ok(path)
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.6}"),
        _ => "-".to_string(),
    }
}
