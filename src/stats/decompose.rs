//! Additive seasonal decomposition of the close series.
//!
//! ```text
//! observed[i] = trend[i] + seasonal[i] + residual[i]
//! ```
//!
//! The trend is a centred moving average over one period (a 2×p average for
//! even periods, so it stays centred). The seasonal component repeats one mean
//! per phase `i % period`, shifted so the phases sum to zero. Trend and residual
//! are undefined for the first and last `period / 2` slots.

use tracing::debug;

use crate::error::PipelineError;

/// Trading days per week; the period used for daily bars.
pub const TRADING_WEEK: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub period: usize,
    pub observed: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    /// One value per phase; sums to zero.
    pub seasonal_pattern: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

impl Decomposition {
    pub fn latest_trend(&self) -> Option<f64> {
        self.trend.iter().rev().find_map(|v| *v)
    }

    /// Sample standard deviation of the defined residuals.
    pub fn residual_std(&self) -> Option<f64> {
        let defined: Vec<f64> = self.residual.iter().flatten().copied().collect();
        if defined.len() < 2 {
            return None;
        }
        let n = defined.len() as f64;
        let mean = defined.iter().sum::<f64>() / n;
        let var = defined.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(var.sqrt())
    }
}

/// Split `values` into trend, seasonal and residual components.
///
/// Needs at least two full periods.
pub fn decompose(values: &[f64], period: usize) -> Result<Decomposition, PipelineError> {
    if period < 2 {
        return Err(PipelineError::invalid(format!(
            "decomposition period must be at least 2, got {period}"
        )));
    }
    let needed = 2 * period;
    if values.len() < needed {
        return Err(PipelineError::insufficient("decomposition", needed, values.len()));
    }

    let trend = centred_moving_average(values, period);

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (&x, t)) in values.iter().zip(&trend).enumerate() {
        if let Some(t) = t {
            sums[i % period] += x - t;
            counts[i % period] += 1;
        }
    }
    // Two full periods leave every phase with at least one defined trend value.
    let phase_means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let offset = phase_means.iter().sum::<f64>() / period as f64;
    let seasonal_pattern: Vec<f64> = phase_means.iter().map(|m| m - offset).collect();

    let seasonal: Vec<f64> = (0..values.len()).map(|i| seasonal_pattern[i % period]).collect();
    let residual = values
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((&x, t), s)| t.map(|t| x - t - s))
        .collect();

    debug!(period, points = values.len(), "decomposed series");
    Ok(Decomposition {
        period,
        observed: values.to_vec(),
        trend,
        seasonal_pattern,
        seasonal,
        residual,
    })
}

/// Centred moving average over `period` observations.
///
/// Odd periods use equal weights; even periods use `period + 1` points with
/// half weight at both ends.
fn centred_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let half = period / 2;
    let weights: Vec<f64> = if period % 2 == 0 {
        (0..=period)
            .map(|k| if k == 0 || k == period { 0.5 } else { 1.0 })
            .collect()
    } else {
        vec![1.0; period]
    };

    let span = weights.len();
    let mut out = vec![None; values.len()];
    if values.len() < span {
        return out;
    }
    for (offset, w) in values.windows(span).enumerate() {
        let sum: f64 = w.iter().zip(&weights).map(|(v, k)| v * k).sum();
        out[offset + half] = Some(sum / period as f64);
    }
    out
}
