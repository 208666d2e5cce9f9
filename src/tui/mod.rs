//! Ratatui-based terminal UI.
//!
//! The TUI provides a sidebar for choosing a ticker, date range and
//! moving-average windows, then renders the statistics table, price chart,
//! candlesticks and correlation heatmap for the current session.
//!
//! All state that matters lives in `Session`; this module only turns key
//! presses into `SessionEvent`s and draws what the session holds.

use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};
use tracing::{info, warn};

use crate::app::pipeline::RunOutput;
use crate::data::YahooClient;
use crate::domain::{DashConfig, RangePreset, UserSelection, parse_windows};
use crate::error::{AppError, PipelineError};
use crate::report::{stat_cell, stats_columns};
use crate::session::{Session, SessionEvent, SessionState};
use crate::stats::Statistic;

mod candles;
mod heatmap;
mod plotters_chart;

use candles::CandlePanel;
use heatmap::HeatmapPanel;
use plotters_chart::PricePlottersChart;

/// Directory the `e` key exports into.
pub const EXPORT_DIR: &str = "export";

/// Start the TUI.
pub fn run(config: DashConfig) -> Result<(), AppError> {
    let client = YahooClient::new(config.fetch.clone())?;
    let session = Session::new(client, config.selection, config.ma_windows);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session);
    app.dispatch(&mut terminal, SessionEvent::Refresh)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Sidebar fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Ticker,
    Start,
    End,
    Windows,
}

impl Field {
    const ALL: [Field; 4] = [Field::Ticker, Field::Start, Field::End, Field::Windows];

    fn label(self) -> &'static str {
        match self {
            Field::Ticker => "Ticker",
            Field::Start => "Start",
            Field::End => "End",
            Field::Windows => "MA windows",
        }
    }
}

/// What a key press asks the event loop to do.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    None,
    Quit,
    Run(SessionEvent),
}

struct App<S> {
    session: Session<S>,
    selected_field: usize,
    editing: bool,
    input: String,
    status: String,
    /// Input rejected before it reached the session (e.g. unparseable date).
    input_error: Option<String>,
}

impl<S: crate::data::MarketDataSource> App<S> {
    fn new(session: Session<S>) -> Self {
        Self {
            session,
            selected_field: 0,
            editing: false,
            input: String::new(),
            status: "Starting...".to_string(),
            input_error: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                self.redraw(terminal)?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match self.handle_key(key.code) {
                        Action::Quit => break,
                        Action::Run(event) => self.dispatch(terminal, event)?,
                        Action::None => {}
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn redraw<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        terminal
            .draw(|f| self.draw(f))
            .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
        Ok(())
    }

    /// Run one session event; the fetch blocks, so show a status frame first.
    fn dispatch<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        event: SessionEvent,
    ) -> Result<(), AppError> {
        self.input_error = None;
        self.status = "Fetching...".to_string();
        self.redraw(terminal)?;

        let today = Local::now().date_naive();
        self.status = match self.session.handle(event, today) {
            Ok(()) => match self.session.last_success() {
                Some(run) => format!("Loaded {} ({} trading days).", run.selection.ticker, run.series.len()),
                None => String::new(),
            },
            Err(err) => format!("{} error.", err.kind_label()),
        };
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Action {
        if self.editing {
            return self.handle_edit(code);
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < Field::ALL.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Enter => {
                self.input = self.field_value(Field::ALL[self.selected_field]);
                self.editing = true;
                self.status = "Editing. Enter to apply, Esc to cancel.".to_string();
            }
            KeyCode::Char('r') => return Action::Run(SessionEvent::Refresh),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('d') => self.write_debug(),
            KeyCode::Char(c) => {
                if let Some(preset) = preset_for_key(c) {
                    let selection = self.session.selection().with_preset(preset);
                    return Action::Run(SessionEvent::SelectionChanged(selection));
                }
            }
            _ => {}
        }

        Action::None
    }

    fn handle_edit(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Esc => {
                self.editing = false;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = false;
                return self.apply_input();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                if !c.is_control() && self.input.len() < 32 {
                    self.input.push(c);
                }
            }
            _ => {}
        }
        Action::None
    }

    /// Turn the edit buffer into a session event.
    fn apply_input(&mut self) -> Action {
        let field = Field::ALL[self.selected_field];
        let raw = self.input.trim().to_string();
        let current = self.session.selection().clone();

        let event = match field {
            Field::Ticker => Ok(SessionEvent::SelectionChanged(UserSelection { ticker: raw, ..current })),
            Field::Start => parse_date(&raw).map(|start| SessionEvent::SelectionChanged(UserSelection { start, ..current })),
            Field::End => parse_date(&raw).map(|end| SessionEvent::SelectionChanged(UserSelection { end, ..current })),
            Field::Windows => parse_windows(&raw).map(SessionEvent::WindowsChanged),
        };

        match event {
            Ok(event) => Action::Run(event),
            Err(err) => {
                self.status = format!("{} error.", err.kind_label());
                self.input_error = Some(err.to_string());
                Action::None
            }
        }
    }

    fn field_value(&self, field: Field) -> String {
        let selection = self.session.selection();
        match field {
            Field::Ticker => selection.ticker.clone(),
            Field::Start => selection.start.to_string(),
            Field::End => selection.end.to_string(),
            Field::Windows => self
                .session
                .ma_windows()
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    fn export(&mut self) {
        let Some(run) = self.session.last_success() else {
            self.status = "Nothing to export yet.".to_string();
            return;
        };
        self.status = match crate::io::export_run(Path::new(EXPORT_DIR), run) {
            Ok(paths) => {
                info!(files = paths.len(), "exported from TUI");
                format!("Exported {} files to {EXPORT_DIR}/", paths.len())
            }
            Err(err) => {
                warn!(%err, "export failed");
                format!("Export failed: {err}")
            }
        };
    }

    fn write_debug(&mut self) {
        let Some(run) = self.session.last_success() else {
            self.status = "No results to dump yet.".to_string();
            return;
        };
        let dir = Path::new(crate::debug::DEBUG_DIR);
        self.status = match crate::debug::write_debug_bundle(dir, run, self.session.last_error()) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(err) => format!("Debug write failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("sd", Style::default().fg(Color::Cyan)),
            Span::raw(" | stock dashboard (Yahoo Finance daily)"),
        ]));

        let shown = match self.session.last_success() {
            Some(run) => {
                let range = run
                    .series
                    .date_range()
                    .map(|(a, b)| format!("{a} .. {b}"))
                    .unwrap_or_default();
                format!(
                    "showing: {} | {range} | {} trading days | MA {:?}",
                    run.selection.ticker,
                    run.series.len(),
                    run.ma_windows
                )
            }
            None => "showing: -".to_string(),
        };
        let state = match self.session.state() {
            SessionState::AwaitingInput => "awaiting input",
            SessionState::DisplayingResults => "displaying results",
        };
        lines.push(Line::from(Span::styled(
            format!("{shown} | {state}"),
            Style::default().fg(Color::Gray),
        )));

        if let Some(message) = self.error_message() {
            lines.push(Line::from(Span::styled(
                message,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    /// Inline error for the header: input errors first, then the session's.
    fn error_message(&self) -> Option<String> {
        if let Some(msg) = &self.input_error {
            return Some(format!("error: {msg}"));
        }
        self.session.last_error().map(|err| {
            if self.session.last_success().is_some() {
                format!("error: {err} (showing previous result)")
            } else {
                format!("error: {err}")
            }
        })
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);

        self.draw_sidebar(frame, chunks[0]);
        self.draw_main(frame, chunks[1]);
    }

    fn draw_sidebar(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(area);

        let items: Vec<ListItem> = Field::ALL
            .iter()
            .enumerate()
            .map(|(i, &field)| {
                let value = if self.editing && i == self.selected_field {
                    format!("{}_", self.input)
                } else {
                    self.field_value(field)
                };
                ListItem::new(format!("{}: {value}", field.label()))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Selection").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let latest = match self.session.last_success() {
            Some(run) => latest_lines(run),
            None => vec![Line::from("No data yet.")],
        };
        let p = Paragraph::new(Text::from(latest)).block(Block::default().title("Latest").borders(Borders::ALL));
        frame.render_widget(p, chunks[1]);
    }

    fn draw_main(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(run) = self.session.last_success() else {
            let block = Block::default().title("Dashboard").borders(Borders::ALL);
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(Clear, inner);

            let (msg, color) = match self.session.last_error() {
                Some(err) => (format!("No results to show.\n{err}"), Color::Red),
                None => ("Waiting for data...".to_string(), Color::Yellow),
            };
            let p = Paragraph::new(msg)
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true });
            frame.render_widget(p, inner);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(Statistic::ALL.len() as u16 + 3),
                Constraint::Min(10),
                Constraint::Percentage(40),
            ])
            .split(area);

        draw_stats_table(frame, chunks[0], run);

        let block = Block::default()
            .title(format!("{} close + moving averages", run.selection.ticker))
            .borders(Borders::ALL);
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);
        frame.render_widget(Clear, inner);
        frame.render_widget(PricePlottersChart { chart: &run.charts.line }, inner);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[2]);
        frame.render_widget(CandlePanel::new(&run.charts.candlestick), bottom[0]);
        frame.render_widget(HeatmapPanel::new(&run.charts.heatmap), bottom[1]);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  Enter edit  1/3/6/y/m range  r refresh  e export  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_stats_table(frame: &mut ratatui::Frame<'_>, area: Rect, run: &RunOutput) {
    let columns = stats_columns(&run.stats);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let header = Row::new(
        std::iter::once(Cell::from(""))
            .chain(columns.iter().map(|(h, _)| Cell::from(*h)))
            .collect::<Vec<_>>(),
    )
    .style(bold);

    let rows = Statistic::ALL.iter().map(|&stat| {
        let cells = std::iter::once(Cell::from(stat.display_name()).style(bold))
            .chain(columns.iter().map(|&(h, s)| Cell::from(stat_cell(s, stat, h))));
        Row::new(cells.collect::<Vec<_>>())
    });

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(6))
        .chain(columns.iter().map(|_| Constraint::Length(14)))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title("Statistics").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn latest_lines(run: &RunOutput) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(bar) = run.series.bars.last() {
        lines.push(Line::from(format!("{}", bar.date)));
        lines.push(Line::from(format!("close  {:.2}", bar.close)));
        lines.push(Line::from(format!("volume {}", bar.volume)));
    }
    for ma in &run.stats.moving_averages {
        let value = ma
            .latest()
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "n/a".to_string());
        lines.push(Line::from(format!("{:<6} {value}", ma.label())));
    }
    if let Ok(d) = &run.decomposition {
        if let Some(trend) = d.latest_trend() {
            lines.push(Line::from(format!("trend  {trend:.2}")));
        }
    }
    if let Some(returns) = &run.stats.returns {
        lines.push(Line::from(format!("ret μ  {:.4}", returns.mean)));
        if let Some(std) = returns.std {
            lines.push(Line::from(format!("ret σ  {std:.4}")));
        }
    }
    lines
}

/// Range preset keys: `1`, `3`, `6` months, `y` one year, `m` max.
fn preset_for_key(c: char) -> Option<RangePreset> {
    match c {
        '1' => Some(RangePreset::OneMonth),
        '3' => Some(RangePreset::ThreeMonths),
        '6' => Some(RangePreset::SixMonths),
        'y' => Some(RangePreset::OneYear),
        'm' => Some(RangePreset::Max),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, PipelineError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| PipelineError::invalid(format!("invalid date '{raw}' (expected YYYY-MM-DD): {e}")))
}
