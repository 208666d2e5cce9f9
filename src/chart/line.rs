//! Close price + moving averages over time.

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::chart::{CLOSE_COLOR, ChartStyle, MA_PALETTE, Rgb, padded_bounds};
use crate::domain::PriceSeries;
use crate::stats::DerivedStatistics;

/// One line on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineTrace {
    pub label: String,
    pub color: Rgb,
    /// `(trading-day index, value)`; only defined values are present.
    pub points: Vec<(f64, f64)>,
}

/// Time-series line chart.
///
/// The x axis is the trading-day index (no gaps for weekends and holidays);
/// `dates` maps an index back to its calendar date for tick labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub dates: Vec<NaiveDate>,
    pub traces: Vec<LineTrace>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

/// Build the close + moving-average chart.
pub fn render_line_chart(series: &PriceSeries, stats: &DerivedStatistics) -> LineChart {
    let close = LineTrace {
        label: "close".to_string(),
        color: CLOSE_COLOR,
        points: series
            .bars
            .iter()
            .enumerate()
            .map(|(i, b)| (i as f64, b.close))
            .collect(),
    };

    let mut traces = vec![close];
    for (k, ma) in stats.moving_averages.iter().enumerate() {
        traces.push(LineTrace {
            label: ma.label(),
            color: MA_PALETTE[k % MA_PALETTE.len()],
            points: ma.defined().map(|(i, v)| (i as f64, v)).collect(),
        });
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in traces.iter().flat_map(|t| t.points.iter()) {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    LineChart {
        title: format!("{} close", series.ticker),
        dates: series.dates(),
        x_bounds: [0.0, series.len().saturating_sub(1).max(1) as f64],
        y_bounds: padded_bounds(y_min, y_max, 0.05),
        traces,
    }
}

impl LineChart {
    /// Date label for an x position (nearest trading day).
    pub fn date_label(&self, x: f64) -> String {
        if self.dates.is_empty() || !x.is_finite() {
            return String::new();
        }
        let idx = (x.round().max(0.0) as usize).min(self.dates.len() - 1);
        self.dates[idx].format("%Y-%m-%d").to_string()
    }

    pub fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        style: &ChartStyle,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        let fg = style.foreground;

        let mut builder = ChartBuilder::on(root);
        builder
            .margin(style.margin)
            .set_label_area_size(LabelAreaPosition::Left, style.label_area_left)
            .set_label_area_size(LabelAreaPosition::Bottom, style.label_area_bottom);
        if let Some(size) = style.caption_size {
            builder.caption(&self.title, ("sans-serif", size).into_font().color(&fg));
        }
        let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(5)
            .y_labels(5)
            .x_label_formatter(&|v| self.date_label(*v))
            .y_label_formatter(&|v| format!("{v:.1}"))
            .label_style(("sans-serif", style.font_size).into_font().color(&fg))
            .axis_style(&fg)
            .draw()?;

        for trace in &self.traces {
            let color = trace.color.to_plotters();
            chart
                .draw_series(LineSeries::new(trace.points.iter().copied(), &color))?
                .label(trace.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
        }

        if style.legend {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .label_font(("sans-serif", style.font_size).into_font().color(&fg))
                .border_style(&fg)
                .background_style(&WHITE.mix(0.8))
                .draw()?;
        }

        Ok(())
    }
}
