//! Chart artifacts.
//!
//! `render_*` functions turn pipeline data into render-only chart descriptions.
//! They never touch their inputs and do no drawing themselves; an artifact can
//! then be drawn by:
//!
//! - Plotters (`draw` methods, generic over the backend) for SVG export and
//!   the line chart in the TUI
//! - direct Ratatui buffer writes (`tui::candles`, `tui::heatmap`)

use plotters::style::RGBColor;

use crate::domain::PriceSeries;
use crate::error::PipelineError;
use crate::stats::{CorrelationMatrix, DerivedStatistics};

pub mod candlestick;
pub mod heatmap;
pub mod line;
pub mod svg;

pub use candlestick::{Candle, CandlestickChart, render_candlestick};
pub use heatmap::{HeatCell, Heatmap, diverging_color, render_heatmap};
pub use line::{LineChart, LineTrace, render_line_chart};

/// Plain RGB triple shared by the Plotters and Ratatui renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }

    pub fn to_ratatui(self) -> ratatui::style::Color {
        ratatui::style::Color::Rgb(self.0, self.1, self.2)
    }

    /// Perceived brightness in `[0, 1]`; used to pick annotation colours.
    pub fn luminance(self) -> f64 {
        (0.299 * self.0 as f64 + 0.587 * self.1 as f64 + 0.114 * self.2 as f64) / 255.0
    }
}

pub const CLOSE_COLOR: Rgb = Rgb(0, 200, 255);
pub const RISING_COLOR: Rgb = Rgb(38, 166, 91);
pub const FALLING_COLOR: Rgb = Rgb(214, 48, 49);

/// Colours cycled through for moving-average traces.
pub const MA_PALETTE: [Rgb; 5] = [
    Rgb(255, 165, 0),
    Rgb(200, 80, 255),
    Rgb(255, 220, 0),
    Rgb(120, 220, 120),
    Rgb(255, 105, 180),
];

/// Sizing/colour knobs for the Plotters renderers.
///
/// Terminal cells are low-res, so the terminal style keeps label areas compact
/// and skips captions; the SVG style is sized for a ~1000px wide document.
#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub margin: u32,
    pub label_area_left: u32,
    pub label_area_bottom: u32,
    pub font_size: u32,
    /// `None` disables the caption.
    pub caption_size: Option<u32>,
    pub foreground: RGBColor,
    pub legend: bool,
}

impl ChartStyle {
    pub fn terminal() -> Self {
        Self {
            margin: 1,
            label_area_left: 6,
            label_area_bottom: 3,
            font_size: 10,
            caption_size: None,
            foreground: RGBColor(255, 255, 255),
            legend: false,
        }
    }

    pub fn svg() -> Self {
        Self {
            margin: 20,
            label_area_left: 70,
            label_area_bottom: 40,
            font_size: 14,
            caption_size: Some(22),
            foreground: RGBColor(30, 30, 30),
            legend: true,
        }
    }
}

/// Every chart of one pipeline run.
#[derive(Debug, Clone)]
pub struct ChartArtifacts {
    pub line: LineChart,
    pub candlestick: CandlestickChart,
    /// Correlation may be undefined; the heatmap area then shows the reason.
    pub heatmap: Result<Heatmap, PipelineError>,
}

/// Build all artifacts for a run.
pub fn render_all(
    series: &PriceSeries,
    stats: &DerivedStatistics,
    correlation: &Result<CorrelationMatrix, PipelineError>,
) -> ChartArtifacts {
    ChartArtifacts {
        line: render_line_chart(series, stats),
        candlestick: render_candlestick(series),
        heatmap: correlation.as_ref().map(render_heatmap).map_err(Clone::clone),
    }
}

/// Pad `[lo, hi]` by `frac` of its width; degenerate or non-finite ranges fall
/// back to something drawable.
pub(crate) fn padded_bounds(lo: f64, hi: f64, frac: f64) -> [f64; 2] {
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        let pad = lo.abs().max(1.0) * frac;
        return [lo - pad, hi + pad];
    }
    let pad = (hi - lo) * frac;
    [lo - pad, hi + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_bounds_handles_flat_and_broken_ranges() {
        assert_eq!(padded_bounds(0.0, 10.0, 0.1), [-1.0, 11.0]);
        let flat = padded_bounds(5.0, 5.0, 0.05);
        assert!(flat[0] < 5.0 && flat[1] > 5.0);
        assert_eq!(padded_bounds(f64::NAN, 1.0, 0.05), [0.0, 1.0]);
    }

    #[test]
    fn luminance_orders_black_and_white() {
        assert!(Rgb(0, 0, 0).luminance() < 0.01);
        assert!(Rgb(255, 255, 255).luminance() > 0.99);
    }
}
