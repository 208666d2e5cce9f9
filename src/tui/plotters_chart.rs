//! Plotters-powered price chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - the same `LineChart::draw` code also produces the exported SVG
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{ChartStyle, LineChart};

/// Close + moving-average chart; all data is prepared by `render_line_chart`.
pub struct PricePlottersChart<'a> {
    pub chart: &'a LineChart,
}

impl Widget for PricePlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.chart.x_bounds;
        let [y0, y1] = self.chart.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let chart = self.chart;
        let style = ChartStyle::terminal();
        let widget = widget_fn(move |root| {
            chart.draw(&root, &style)?;
            Ok(())
        });

        widget.render(area, buf);
    }
}
