//! Pearson correlation between the numeric columns of a price series.
//!
//! The coefficients come from the sample covariance of the centered data
//! matrix:
//!
//! ```text
//! C = Xcᵀ Xc / (n - 1)        r_ij = C_ij / sqrt(C_ii C_jj)
//! ```
//!
//! Constant columns have no defined coefficient, so they are left out of the
//! matrix (and listed in `excluded`) instead of producing NaN rows.

use nalgebra::DMatrix;
use tracing::debug;

use crate::domain::{Column, PriceSeries};
use crate::error::PipelineError;

/// Minimum rows (and columns) for a defined correlation.
pub const MIN_CORRELATION_POINTS: usize = 2;

/// Symmetric correlation matrix with a unit diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    columns: Vec<Column>,
    excluded: Vec<Column>,
    values: DMatrix<f64>,
}

impl CorrelationMatrix {
    /// Columns in matrix order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Constant columns that were left out.
    pub fn excluded(&self) -> &[Column] {
        &self.excluded
    }

    pub fn size(&self) -> usize {
        self.columns.len()
    }

    /// Coefficient by position. Panics if out of bounds.
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.values[(row, col)]
    }

    /// Coefficient by column name; `None` if either column is not in the matrix.
    pub fn get(&self, a: Column, b: Column) -> Option<f64> {
        let i = self.columns.iter().position(|&c| c == a)?;
        let j = self.columns.iter().position(|&c| c == b)?;
        Some(self.values[(i, j)])
    }

    /// Row-major copy of the coefficients (for exports).
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.values
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

/// Correlate the OHLCV columns of `series`.
pub fn correlate(series: &PriceSeries) -> Result<CorrelationMatrix, PipelineError> {
    let n = series.len();
    if n < MIN_CORRELATION_POINTS {
        return Err(PipelineError::insufficient(
            "correlation (rows)",
            MIN_CORRELATION_POINTS,
            n,
        ));
    }

    let (columns, excluded): (Vec<Column>, Vec<Column>) = Column::ALL
        .into_iter()
        .partition(|&c| !is_constant(&series.column(c)));
    if !excluded.is_empty() {
        debug!(?excluded, "constant columns left out of correlation");
    }

    let k = columns.len();
    if k < MIN_CORRELATION_POINTS {
        return Err(PipelineError::insufficient(
            "correlation (non-constant columns)",
            MIN_CORRELATION_POINTS,
            k,
        ));
    }

    let data = DMatrix::from_fn(n, k, |r, c| series.bars[r].value(columns[c]));
    let means = data.row_mean();
    let mut centered = data;
    for (j, mut col) in centered.column_iter_mut().enumerate() {
        col.add_scalar_mut(-means[j]);
    }

    let cov = centered.transpose() * &centered / (n as f64 - 1.0);
    let values = DMatrix::from_fn(k, k, |i, j| {
        if i == j {
            1.0
        } else {
            (cov[(i, j)] / (cov[(i, i)] * cov[(j, j)]).sqrt()).clamp(-1.0, 1.0)
        }
    });

    Ok(CorrelationMatrix {
        columns,
        excluded,
        values,
    })
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::*;
    use crate::domain::Bar;

    fn series(rows: &[(f64, f64, f64, f64, u64)]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close, volume))| Bar {
                date: start + Days::new(i as u64),
                open,
                high,
                low,
                close,
                volume,
            })
            .collect();
        PriceSeries::new("TEST", bars)
    }

    #[test]
    fn identical_columns_correlate_perfectly() {
        let rows: Vec<_> = (1..=10u64)
            .map(|i| (i as f64, i as f64, i as f64, i as f64, i))
            .collect();
        let m = correlate(&series(&rows)).unwrap();
        assert_eq!(m.size(), 5);
        for i in 0..5 {
            for j in 0..5 {
                assert!((m.at(i, j) - 1.0).abs() < 1e-12, "r[{i},{j}] = {}", m.at(i, j));
            }
        }
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let rows = [
            (10.0, 11.0, 9.5, 10.5, 900),
            (10.5, 12.0, 10.0, 11.8, 1_500),
            (11.8, 12.1, 10.9, 11.0, 700),
            (11.0, 11.4, 9.0, 9.2, 2_100),
            (9.2, 10.0, 8.8, 9.9, 1_200),
        ];
        let m = correlate(&series(&rows)).unwrap();
        for i in 0..m.size() {
            assert_eq!(m.at(i, i), 1.0);
            for j in 0..m.size() {
                assert!((m.at(i, j) - m.at(j, i)).abs() < 1e-12);
                assert!((-1.0..=1.0).contains(&m.at(i, j)));
            }
        }
    }

    #[test]
    fn anti_correlated_columns() {
        let rows: Vec<_> = (0..6u64)
            .map(|i| (i as f64, 10.0 - i as f64, 3.0, 3.0, 50))
            .collect();
        let m = correlate(&series(&rows)).unwrap();
        assert_eq!(m.columns(), &[Column::Open, Column::High]);
        assert_eq!(m.excluded(), &[Column::Low, Column::Close, Column::Volume]);
        assert!((m.get(Column::Open, Column::High).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(m.get(Column::Open, Column::Close), None);
    }

    #[test]
    fn fewer_than_two_rows_is_insufficient() {
        let err = correlate(&series(&[(1.0, 2.0, 0.5, 1.5, 10)])).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { needed: 2, got: 1, .. }));
        let err = correlate(&series(&[])).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { got: 0, .. }));
    }

    #[test]
    fn all_constant_columns_is_insufficient() {
        let rows = [(1.0, 1.0, 1.0, 1.0, 5), (1.0, 1.0, 1.0, 1.0, 5)];
        assert!(matches!(
            correlate(&series(&rows)),
            Err(PipelineError::InsufficientData { .. })
        ));
    }
}
