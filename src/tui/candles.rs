//! Candlestick panel rendered with direct buffer writes.
//!
//! - each candle = 1 terminal column (latest candles win when space runs out)
//! - body: `█` rising, `▓` falling, coloured by direction
//! - wicks: `|` up to the high and down to the low

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Widget},
};

use crate::chart::CandlestickChart;

/// Width reserved for the price labels on the left.
const LABEL_WIDTH: u16 = 9;

pub struct CandlePanel<'a> {
    chart: &'a CandlestickChart,
}

impl<'a> CandlePanel<'a> {
    pub fn new(chart: &'a CandlestickChart) -> Self {
        Self { chart }
    }
}

/// Map a price to a row in the plot area (0 = top).
fn price_to_y(price: f64, y_min: f64, y_max: f64, plot_height: u16) -> u16 {
    if (y_max - y_min).abs() < 1e-9 || plot_height == 0 {
        return 0;
    }
    let frac = (price - y_min) / (y_max - y_min);
    let y = plot_height.saturating_sub(1) as f64 * (1.0 - frac);
    y.round().max(0.0).min(plot_height.saturating_sub(1) as f64) as u16
}

impl Widget for CandlePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let candles = &self.chart.candles;
        let rising = self.chart.rising_count();
        let title = format!(
            " {} | {} up {} down ",
            self.chart.title,
            rising,
            candles.len() - rising
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        block.render(area, buf);

        let plot_left = inner.x + LABEL_WIDTH;
        let plot_top = inner.y;
        let plot_width = inner.width.saturating_sub(LABEL_WIDTH);
        let plot_height = inner.height.saturating_sub(1);
        if plot_width == 0 || plot_height == 0 || candles.is_empty() {
            return;
        }

        let [y_lower, y_upper] = self.chart.y_bounds;
        let muted = Style::default().fg(Color::Gray);

        let y_labels = [y_upper, (y_upper + y_lower) / 2.0, y_lower];
        let y_positions = [0u16, plot_height / 2, plot_height.saturating_sub(1)];
        for (value, y_pos) in y_labels.iter().zip(y_positions) {
            buf.set_string(inner.x, plot_top + y_pos, format!("{value:>8.2}"), muted);
        }

        let shown = candles.len().min(plot_width as usize);
        let visible = &candles[candles.len() - shown..];

        for (i, candle) in visible.iter().enumerate() {
            let x = plot_left + i as u16;
            let style = Style::default().fg(candle.color().to_ratatui());

            let high_y = price_to_y(candle.high, y_lower, y_upper, plot_height);
            let low_y = price_to_y(candle.low, y_lower, y_upper, plot_height);
            let body_top = price_to_y(candle.open.max(candle.close), y_lower, y_upper, plot_height);
            let body_bottom = price_to_y(candle.open.min(candle.close), y_lower, y_upper, plot_height);

            for y in high_y..body_top {
                buf.set_string(x, plot_top + y, "|", style);
            }
            let body = if candle.is_rising() { "\u{2588}" } else { "\u{2593}" };
            for y in body_top..=body_bottom {
                buf.set_string(x, plot_top + y, body, style);
            }
            for y in (body_bottom + 1)..=low_y {
                buf.set_string(x, plot_top + y, "|", style);
            }
        }

        // Date span of the visible candles on the bottom row.
        if let (Some(first), Some(last)) = (visible.first(), visible.last()) {
            let info = format!("{} .. {}", first.date, last.date);
            buf.set_stringn(plot_left, plot_top + plot_height, info, plot_width as usize, muted);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::*;
    use crate::chart::render_candlestick;
    use crate::domain::{Bar, PriceSeries};

    fn content(buf: &Buffer, area: Rect) -> String {
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "));
            }
            out.push('\n');
        }
        out
    }

    fn series() -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
        let prices = [(100.0, 101.0), (101.0, 100.5), (100.5, 103.0)];
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &(open, close))| Bar {
                date: start + Days::new(i as u64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000,
            })
            .collect();
        PriceSeries::new("SPY", bars)
    }

    #[test]
    fn renders_bodies_and_counts() {
        let chart = render_candlestick(&series());
        let area = Rect::new(0, 0, 40, 16);
        let mut buf = Buffer::empty(area);
        CandlePanel::new(&chart).render(area, &mut buf);

        let text = content(&buf, area);
        assert!(text.contains("2 up 1 down"));
        assert!(text.contains('\u{2588}'));
        assert!(text.contains('\u{2593}'));
        assert!(text.contains("2023-01-03 .. 2023-01-05"));
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let chart = render_candlestick(&series());
        let area = Rect::new(0, 0, 6, 3);
        let mut buf = Buffer::empty(area);
        CandlePanel::new(&chart).render(area, &mut buf);
    }
}
