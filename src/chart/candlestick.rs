//! OHLC candlestick chart: one candle per trading day, no aggregation.

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::chart::{ChartStyle, FALLING_COLOR, RISING_COLOR, Rgb, padded_bounds};
use crate::domain::PriceSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub date: NaiveDate,
    pub x: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Close at or above open.
    pub fn is_rising(&self) -> bool {
        self.close >= self.open
    }

    pub fn color(&self) -> Rgb {
        if self.is_rising() { RISING_COLOR } else { FALLING_COLOR }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandlestickChart {
    pub title: String,
    pub candles: Vec<Candle>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

pub fn render_candlestick(series: &PriceSeries) -> CandlestickChart {
    let candles: Vec<Candle> = series
        .bars
        .iter()
        .enumerate()
        .map(|(i, b)| Candle {
            date: b.date,
            x: i as f64,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
        })
        .collect();

    let y_min = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let y_max = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);

    CandlestickChart {
        title: format!("{} daily candles", series.ticker),
        x_bounds: [-1.0, candles.len() as f64],
        y_bounds: padded_bounds(y_min, y_max, 0.05),
        candles,
    }
}

impl CandlestickChart {
    pub fn rising_count(&self) -> usize {
        self.candles.iter().filter(|c| c.is_rising()).count()
    }

    fn date_label(&self, x: f64) -> String {
        let idx = x.round();
        if idx < 0.0 {
            return String::new();
        }
        self.candles
            .get(idx as usize)
            .map(|c| c.date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
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
            .x_labels(5)
            .y_labels(5)
            .x_label_formatter(&|v| self.date_label(*v))
            .y_label_formatter(&|v| format!("{v:.1}"))
            .label_style(("sans-serif", style.font_size).into_font().color(&fg))
            .axis_style(&fg)
            .light_line_style(&fg.mix(0.05))
            .draw()?;

        // Candle body width: ~70% of the horizontal space per trading day.
        let plot_width = chart.plotting_area().dim_in_pixel().0 as f64;
        let slots = (x1 - x0).max(1.0);
        let body_width = ((plot_width / slots) * 0.7).max(1.0) as u32;

        let rising = RISING_COLOR.to_plotters();
        let falling = FALLING_COLOR.to_plotters();
        chart.draw_series(self.candles.iter().map(|c| {
            CandleStick::new(
                c.x,
                c.open,
                c.high,
                c.low,
                c.close,
                rising.filled(),
                falling.filled(),
                body_width,
            )
        }))?;

        Ok(())
    }
}
