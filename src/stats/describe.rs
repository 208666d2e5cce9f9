//! Descriptive statistics over a price series.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Column, PriceSeries, validate_windows};
use crate::error::PipelineError;
use crate::stats::rolling::{daily_returns, moving_average};

/// Named statistics of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Count,
    Mean,
    Std,
    Min,
    P25,
    P50,
    P75,
    Max,
}

impl Statistic {
    pub const ALL: [Statistic; 8] = [
        Statistic::Count,
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::P25,
        Statistic::P50,
        Statistic::P75,
        Statistic::Max,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::P25 => "25%",
            Statistic::P50 => "50%",
            Statistic::P75 => "75%",
            Statistic::Max => "max",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1); `None` for a single observation.
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// Summarize `values`; `None` when empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.len() > 1).then(|| {
            let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (ss / (n - 1.0)).sqrt()
        });

        Some(Self {
            count: values.len(),
            mean,
            std,
            min: sorted[0],
            p25: percentile_sorted(&sorted, 0.25),
            p50: percentile_sorted(&sorted, 0.50),
            p75: percentile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }

    pub fn get(&self, stat: Statistic) -> Option<f64> {
        match stat {
            Statistic::Count => Some(self.count as f64),
            Statistic::Mean => Some(self.mean),
            Statistic::Std => self.std,
            Statistic::Min => Some(self.min),
            Statistic::P25 => Some(self.p25),
            Statistic::P50 => Some(self.p50),
            Statistic::P75 => Some(self.p75),
            Statistic::Max => Some(self.max),
        }
    }
}

/// Quantile `q ∈ [0, 1]` of pre-sorted, non-empty data, interpolating linearly
/// between the two closest ranks.
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Moving average of closes for one window, aligned to the series dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverage {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

impl MovingAverage {
    pub fn label(&self) -> String {
        format!("MA{}", self.window)
    }

    pub fn defined(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Everything `describe` derives from one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStatistics {
    pub dates: Vec<NaiveDate>,
    pub columns: BTreeMap<Column, ColumnSummary>,
    /// Close-to-close returns, aligned to `dates` (first slot `None`).
    pub daily_returns: Vec<Option<f64>>,
    /// Summary of the defined daily returns; `None` with fewer than 2 bars.
    pub returns: Option<ColumnSummary>,
    pub moving_averages: Vec<MovingAverage>,
}

impl DerivedStatistics {
    pub fn value(&self, column: Column, stat: Statistic) -> Option<f64> {
        self.columns.get(&column).and_then(|s| s.get(stat))
    }

    pub fn moving_average(&self, window: usize) -> Option<&MovingAverage> {
        self.moving_averages.iter().find(|ma| ma.window == window)
    }
}

/// Compute descriptive statistics and the requested moving averages.
///
/// An empty series is reported as `InsufficientData` instead of producing
/// degenerate numbers.
pub fn describe(series: &PriceSeries, windows: &[usize]) -> Result<DerivedStatistics, PipelineError> {
    validate_windows(windows)?;
    if series.is_empty() {
        return Err(PipelineError::insufficient("statistics", 1, 0));
    }

    let mut columns = BTreeMap::new();
    for column in Column::ALL {
        if let Some(summary) = ColumnSummary::from_values(&series.column(column)) {
            columns.insert(column, summary);
        }
    }

    let closes = series.closes();
    let daily_returns = daily_returns(&closes);
    let defined_returns: Vec<f64> = daily_returns.iter().flatten().copied().collect();
    let returns = ColumnSummary::from_values(&defined_returns);

    let moving_averages = windows
        .iter()
        .map(|&window| MovingAverage {
            window,
            values: moving_average(&closes, window),
        })
        .collect();

    Ok(DerivedStatistics {
        dates: series.dates(),
        columns,
        daily_returns,
        returns,
        moving_averages,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Days;
    use proptest::prelude::*;

    use super::*;
    use crate::domain::Bar;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + Days::new(i as u64),
                open: c - 0.5,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1_000 + i as u64,
            })
            .collect();
        PriceSeries::new("TEST", bars)
    }

    #[test]
    fn empty_series_is_insufficient() {
        let err = describe(&series_from_closes(&[]), &[20]).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { got: 0, .. }));
    }

    #[test]
    fn zero_window_is_invalid() {
        let err = describe(&series_from_closes(&[1.0, 2.0]), &[0]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn summary_matches_hand_computed_values() {
        let s = ColumnSummary::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.p25, 1.75);
        assert_eq!(s.p50, 2.5);
        assert_eq!(s.p75, 3.25);
        // Sample variance of 1..=4 is 5/3.
        assert!((s.std.unwrap() - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_std() {
        let s = ColumnSummary::from_values(&[7.0]).unwrap();
        assert_eq!(s.std, None);
        assert_eq!(s.p25, 7.0);
        assert_eq!(s.p75, 7.0);
        assert_eq!(s.get(Statistic::Std), None);
    }

    #[test]
    fn describe_builds_each_requested_window() {
        let stats = describe(&series_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]), &[2, 5, 10]).unwrap();
        assert_eq!(stats.moving_averages.len(), 3);
        assert_eq!(stats.moving_average(2).unwrap().latest(), Some(4.5));
        assert_eq!(stats.moving_average(5).unwrap().defined().count(), 1);
        assert_eq!(stats.moving_average(10).unwrap().defined().count(), 0);
        assert_eq!(stats.value(Column::Close, Statistic::Max), Some(5.0));
        assert_eq!(stats.value(Column::Volume, Statistic::Min), Some(1_000.0));
        assert_eq!(stats.returns.as_ref().unwrap().count, 4);
    }

    proptest! {
        #[test]
        fn close_summary_brackets_every_close(
            closes in prop::collection::vec(0.01f64..10_000.0, 1..200),
        ) {
            let stats = describe(&series_from_closes(&closes), &[]).unwrap();
            let min = stats.value(Column::Close, Statistic::Min).unwrap();
            let max = stats.value(Column::Close, Statistic::Max).unwrap();
            let median = stats.value(Column::Close, Statistic::P50).unwrap();

            for c in &closes {
                prop_assert!(min <= *c && *c <= max);
            }
            prop_assert!(min <= median && median <= max);
            let p25 = stats.value(Column::Close, Statistic::P25).unwrap();
            let p75 = stats.value(Column::Close, Statistic::P75).unwrap();
            prop_assert!(p25 <= median && median <= p75);
        }
    }
}
