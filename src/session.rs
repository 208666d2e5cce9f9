//! Dashboard session: the explicit state behind the UI.
//!
//! The front-end never keeps results itself. It turns user input into
//! `SessionEvent`s and renders whatever the session holds:
//!
//! - the current `UserSelection` and moving-average windows
//! - the last successful `RunOutput` (kept when a later run fails)
//! - the last error, shown inline until the next successful run
//!
//! Each event runs the pipeline exactly once, synchronously.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::app::pipeline::{RunOutput, run_pipeline};
use crate::data::MarketDataSource;
use crate::domain::UserSelection;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No successful run yet; the UI shows the default selection.
    AwaitingInput,
    /// At least one run succeeded; its output is on screen.
    DisplayingResults,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SelectionChanged(UserSelection),
    WindowsChanged(Vec<usize>),
    /// Re-run the current selection (e.g. initial load or manual refresh).
    Refresh,
}

pub struct Session<S> {
    source: S,
    selection: UserSelection,
    ma_windows: Vec<usize>,
    state: SessionState,
    last_success: Option<RunOutput>,
    last_error: Option<PipelineError>,
    runs: usize,
}

impl<S: MarketDataSource> Session<S> {
    pub fn new(source: S, selection: UserSelection, ma_windows: Vec<usize>) -> Self {
        Self {
            source,
            selection,
            ma_windows,
            state: SessionState::AwaitingInput,
            last_success: None,
            last_error: None,
            runs: 0,
        }
    }

    /// Apply one event and re-run the pipeline.
    ///
    /// On success the new output replaces the previous one. On failure the
    /// error is recorded and the previous output (if any) stays on display.
    pub fn handle(&mut self, event: SessionEvent, today: NaiveDate) -> Result<(), PipelineError> {
        match event {
            SessionEvent::SelectionChanged(selection) => self.selection = selection,
            SessionEvent::WindowsChanged(windows) => self.ma_windows = windows,
            SessionEvent::Refresh => {}
        }

        self.runs += 1;
        match run_pipeline(&self.source, &self.selection, &self.ma_windows, today) {
            Ok(output) => {
                info!(run = self.runs, selection = %output.selection, "session updated");
                self.last_success = Some(output);
                self.last_error = None;
                self.state = SessionState::DisplayingResults;
                Ok(())
            }
            Err(err) => {
                warn!(run = self.runs, %err, "pipeline run failed; keeping previous result");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> &UserSelection {
        &self.selection
    }

    pub fn ma_windows(&self) -> &[usize] {
        &self.ma_windows
    }

    pub fn last_success(&self) -> Option<&RunOutput> {
        self.last_success.as_ref()
    }

    pub fn last_error(&self) -> Option<&PipelineError> {
        self.last_error.as_ref()
    }

    /// Number of pipeline runs so far.
    pub fn runs(&self) -> usize {
        self.runs
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::Days;

    use super::*;
    use crate::domain::Bar;

    /// Serves canned responses in order; the last one repeats.
    struct ScriptedSource {
        responses: RefCell<Vec<Result<Vec<Bar>, PipelineError>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<Bar>, PipelineError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
            }
        }
    }

    impl MarketDataSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fetch_daily(&self, _selection: &UserSelection) -> Result<Vec<Bar>, PipelineError> {
            let mut responses = self.responses.borrow_mut();
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses[0].clone()
            }
        }
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn bars(n: u64) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                date: d(3, 1) + Days::new(i),
                open: 10.0 + i as f64,
                high: 11.0 + i as f64 * 1.2,
                low: 9.0 + i as f64,
                close: 10.5 + i as f64 * 1.1,
                volume: 100 + i * 7,
            })
            .collect()
    }

    fn selection() -> UserSelection {
        UserSelection::new("AAPL", d(3, 1), d(3, 31))
    }

    #[test]
    fn starts_awaiting_input() {
        let session = Session::new(ScriptedSource::new(vec![Ok(bars(5))]), selection(), vec![2]);
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert!(session.last_success().is_none());
        assert_eq!(session.runs(), 0);
    }

    #[test]
    fn success_then_failure_keeps_previous_result() {
        let source = ScriptedSource::new(vec![
            Ok(bars(5)),
            Err(PipelineError::unavailable("connection reset")),
        ]);
        let mut session = Session::new(source, selection(), vec![2]);

        session.handle(SessionEvent::Refresh, d(6, 1)).unwrap();
        assert_eq!(session.state(), SessionState::DisplayingResults);
        assert_eq!(session.last_success().unwrap().series.len(), 5);

        let next = UserSelection::new("MSFT", d(3, 1), d(3, 31));
        let err = session
            .handle(SessionEvent::SelectionChanged(next.clone()), d(6, 1))
            .unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable(_)));
        assert_eq!(session.state(), SessionState::DisplayingResults);
        assert_eq!(session.selection(), &next);
        assert_eq!(session.last_success().unwrap().selection.ticker, "AAPL");
        assert_eq!(session.last_error(), Some(&err));
    }

    #[test]
    fn failure_without_history_stays_awaiting_input() {
        let mut session = Session::new(ScriptedSource::new(vec![Ok(Vec::new())]), selection(), vec![]);
        let err = session.handle(SessionEvent::Refresh, d(6, 1)).unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable(_)));
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert!(session.last_success().is_none());
    }

    #[test]
    fn invalid_selection_is_reported_inline() {
        let mut session = Session::new(ScriptedSource::new(vec![Ok(bars(5))]), selection(), vec![]);
        session.handle(SessionEvent::Refresh, d(6, 1)).unwrap();

        let backwards = UserSelection::new("AAPL", d(3, 31), d(3, 1));
        let err = session
            .handle(SessionEvent::SelectionChanged(backwards), d(6, 1))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(session.last_success().is_some());
    }

    #[test]
    fn success_clears_previous_error_and_windows_apply() {
        let source = ScriptedSource::new(vec![Err(PipelineError::unavailable("down")), Ok(bars(6))]);
        let mut session = Session::new(source, selection(), vec![2]);

        assert!(session.handle(SessionEvent::Refresh, d(6, 1)).is_err());
        assert!(session.last_error().is_some());

        session
            .handle(SessionEvent::WindowsChanged(vec![3, 5]), d(6, 1))
            .unwrap();
        assert!(session.last_error().is_none());
        let out = session.last_success().unwrap();
        assert_eq!(out.ma_windows, vec![3, 5]);
        assert_eq!(out.stats.moving_averages.len(), 2);
        assert_eq!(session.runs(), 2);
    }
}
