//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - dispatches to the TUI or a one-shot command

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Days, Local, NaiveDate};
use clap::Parser;

use crate::cli::{Command, DashArgs, ExportArgs, SummaryArgs};
use crate::domain::{DEFAULT_LOOKBACK_DAYS, DashConfig, FetchConfig, UserSelection};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sd` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry STOCK_DASH_BASE_URL / RUST_LOG; load it before clap
    // reads env-backed defaults.
    dotenvy::dotenv().ok();

    // We want `sd` and `sd -t MSFT` to behave like `sd tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Summary(args) => handle_summary(args),
        Command::Export(args) => handle_export(args),
    }
}

fn handle_tui(args: DashArgs) -> Result<(), AppError> {
    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(crate::logging::DEFAULT_LOG_FILE));
    crate::logging::init_file(&log_file)?;

    let config = dash_config_from_args(&args, Local::now().date_naive())?;
    crate::tui::run(config)
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    crate::logging::init_stderr();

    let config = dash_config_from_args(&args.dash, Local::now().date_naive())?;
    let run = pipeline::run_once(&config)?;

    println!("{}", crate::report::format_run_summary(&run));
    println!("{}", crate::report::format_stats_table(&run.stats));
    println!("{}", crate::report::format_correlation_table(&run.correlation));
    println!("{}", crate::report::format_decomposition(&run.decomposition));

    if !args.no_plot {
        let plot = crate::plot::render_ascii_line_chart(&run.charts.line, args.width, args.height);
        println!("{plot}");
    }

    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    crate::logging::init_stderr();

    let config = dash_config_from_args(&args.dash, Local::now().date_naive())?;
    let run = pipeline::run_once(&config)?;

    for path in crate::io::export_run(&args.out, &run)? {
        println!("{}", path.display());
    }
    Ok(())
}

/// Resolve CLI arguments into a run configuration.
///
/// - `--end` defaults to `today`
/// - `--start` defaults to one lookback period before the end
/// - windows are sorted and de-duplicated; zero is rejected
pub fn dash_config_from_args(args: &DashArgs, today: NaiveDate) -> Result<DashConfig, AppError> {
    let end = args.end.unwrap_or(today);
    let start = args
        .start
        .unwrap_or_else(|| end.checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS)).unwrap_or(end));

    let mut ma_windows = args.ma_windows.clone();
    crate::domain::validate_windows(&ma_windows)?;
    ma_windows.sort_unstable();
    ma_windows.dedup();

    Ok(DashConfig {
        selection: UserSelection::new(args.ticker.clone(), start, end),
        ma_windows,
        fetch: FetchConfig {
            base_url: args.base_url.trim_end_matches('/').to_string(),
            timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
            retries: args.retries,
            retry_backoff: Duration::from_millis(args.retry_backoff_ms),
        },
    })
}

/// Rewrite argv so `sd` defaults to `sd tui`.
///
/// Rules:
/// - `sd`                      -> `sd tui`
/// - `sd -t MSFT ...`          -> `sd tui -t MSFT ...`
/// - `sd --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "summary" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rewrite_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["sd"])), argv(&["sd", "tui"]));
        assert_eq!(rewrite_args(argv(&["sd", "-t", "MSFT"])), argv(&["sd", "tui", "-t", "MSFT"]));
        assert_eq!(rewrite_args(argv(&["sd", "summary"])), argv(&["sd", "summary"]));
        assert_eq!(rewrite_args(argv(&["sd", "--help"])), argv(&["sd", "--help"]));
    }

    #[test]
    fn config_defaults_cover_the_last_year() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let cli = Cli::parse_from(argv(&["sd", "tui", "--ma", "50,20,20", "--timeout-secs", "0"]));
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };

        let config = dash_config_from_args(&args, today).unwrap();
        assert_eq!(config.selection.end, today);
        assert_eq!(config.selection.start, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
        assert_eq!(config.ma_windows, vec![20, 50]);
        assert_eq!(config.fetch.timeout, None);
    }

    #[test]
    fn zero_window_is_invalid_input() {
        let cli = Cli::parse_from(argv(&["sd", "tui", "--ma", "0"]));
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        let err = dash_config_from_args(&args, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INVALID_INPUT);
    }
}
