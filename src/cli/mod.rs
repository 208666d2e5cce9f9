//! Command-line parsing for the stock dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fetching/statistics code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::{DEFAULT_BASE_URL, DEFAULT_MA_WINDOWS, DEFAULT_TICKER};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sd", version, about = "Stock price dashboard (Yahoo Finance daily bars)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(DashArgs),
    /// Fetch once and print statistics, correlation and an ASCII chart.
    Summary(SummaryArgs),
    /// Fetch once and write prices CSV, statistics JSON and chart SVGs.
    Export(ExportArgs),
}

/// Selection and fetch options shared by every command.
#[derive(Debug, Parser, Clone)]
pub struct DashArgs {
    /// Ticker symbol (e.g. AAPL, BRK-B, ^GSPC).
    #[arg(short = 't', long, default_value = DEFAULT_TICKER)]
    pub ticker: String,

    /// First day of the range (YYYY-MM-DD). Defaults to one year before `--end`.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Moving-average windows in trading days.
    #[arg(long = "ma", value_delimiter = ',', default_values_t = DEFAULT_MA_WINDOWS)]
    pub ma_windows: Vec<usize>,

    /// HTTP timeout in seconds (0 disables the timeout).
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Extra attempts after a transport error or 5xx response.
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Base delay between retries; attempt `n` waits `n` times this.
    #[arg(long, default_value_t = 500)]
    pub retry_backoff_ms: u64,

    /// Market data endpoint.
    #[arg(long, env = "STOCK_DASH_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Log file for the TUI (other commands log to stderr).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub dash: DashArgs,

    /// Skip the ASCII chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub dash: DashArgs,

    /// Output directory (created if missing).
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["sd", "tui"]).unwrap();
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        assert_eq!(args.ticker, "AAPL");
        assert_eq!(args.ma_windows, vec![20, 50]);
        assert_eq!(args.start, None);
        assert_eq!(args.timeout_secs, 30);
        assert_eq!(args.retries, 0);
    }

    #[test]
    fn parses_export_with_dates_and_windows() {
        let cli = Cli::try_parse_from([
            "sd", "export", "-t", "msft", "--start", "2023-01-01", "--end", "2023-01-10", "--ma", "5,10",
            "--out", "out",
        ])
        .unwrap();
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.dash.ticker, "msft");
        assert_eq!(args.dash.start, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(args.dash.ma_windows, vec![5, 10]);
        assert_eq!(args.out, PathBuf::from("out"));
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Cli::try_parse_from(["sd", "summary", "--start", "2023-13-01"]).is_err());
    }
}
