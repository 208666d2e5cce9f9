//! Correlation heatmap with a diverging colour scale centred at 0.

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::chart::{ChartStyle, Rgb};
use crate::stats::CorrelationMatrix;

/// Colour for -1 (blue end of a red/blue diverging scale).
pub const NEGATIVE_END: Rgb = Rgb(33, 102, 172);
/// Colour for 0.
pub const NEUTRAL: Rgb = Rgb(247, 247, 247);
/// Colour for +1.
pub const POSITIVE_END: Rgb = Rgb(178, 24, 43);

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub row: usize,
    pub col: usize,
    pub value: f64,
    pub color: Rgb,
    /// Coefficient formatted for display (two decimals).
    pub annotation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub title: String,
    pub labels: Vec<String>,
    /// Row-major, `labels.len()²` cells.
    pub cells: Vec<HeatCell>,
}

/// Map a coefficient in `[-1, 1]` onto the diverging scale.
pub fn diverging_color(value: f64) -> Rgb {
    let t = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
    let end = if t >= 0.0 { POSITIVE_END } else { NEGATIVE_END };
    let w = t.abs();
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * w).round() as u8;
    Rgb(mix(NEUTRAL.0, end.0), mix(NEUTRAL.1, end.1), mix(NEUTRAL.2, end.2))
}

pub fn render_heatmap(matrix: &CorrelationMatrix) -> Heatmap {
    let k = matrix.size();
    let mut cells = Vec::with_capacity(k * k);
    for row in 0..k {
        for col in 0..k {
            let value = matrix.at(row, col);
            cells.push(HeatCell {
                row,
                col,
                value,
                color: diverging_color(value),
                annotation: format!("{value:.2}"),
            });
        }
    }

    Heatmap {
        title: "Correlation (Pearson)".to_string(),
        labels: matrix
            .columns()
            .iter()
            .map(|c| c.display_name().to_string())
            .collect(),
        cells,
    }
}

impl Heatmap {
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&HeatCell> {
        self.cells.get(row * self.size() + col)
    }

    /// Draw the grid with row/column labels in an extra leading row/column.
    ///
    /// Coordinates: cell `(i, j)` spans `x ∈ [j, j+1]`, `y ∈ [k-1-i, k-i]`;
    /// column labels sit in `y ∈ [k, k+1]`, row labels in `x ∈ [-1, 0]`.
    pub fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        style: &ChartStyle,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let k = self.size() as f64;
        let fg = style.foreground;

        let mut builder = ChartBuilder::on(root);
        builder.margin(style.margin);
        if let Some(size) = style.caption_size {
            builder.caption(&self.title, ("sans-serif", size).into_font().color(&fg));
        }
        let mut chart = builder.build_cartesian_2d(-1.0..k, 0.0..k + 1.0)?;

        chart.draw_series(self.cells.iter().map(|c| {
            let x = c.col as f64;
            let y = k - 1.0 - c.row as f64;
            Rectangle::new([(x, y), (x + 1.0, y + 1.0)], c.color.to_plotters().filled())
        }))?;

        let centered = Pos::new(HPos::Center, VPos::Center);
        let font = ("sans-serif", style.font_size).into_font();

        chart.draw_series(self.cells.iter().map(|c| {
            let text_color = if c.color.luminance() > 0.55 { BLACK } else { WHITE };
            let x = c.col as f64 + 0.5;
            let y = k - 0.5 - c.row as f64;
            Text::new(c.annotation.clone(), (x, y), font.clone().color(&text_color).pos(centered))
        }))?;

        chart.draw_series(self.labels.iter().enumerate().flat_map(|(i, label)| {
            let label_style = font.clone().color(&fg).pos(centered);
            [
                Text::new(label.clone(), (i as f64 + 0.5, k + 0.5), label_style.clone()),
                Text::new(label.clone(), (-0.5, k - 0.5 - i as f64), label_style),
            ]
        }))?;

        Ok(())
    }
}
