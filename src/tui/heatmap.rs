//! Correlation heatmap panel: coloured cells with the coefficient inside.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::chart::Heatmap;
use crate::error::PipelineError;

const ROW_LABEL_WIDTH: u16 = 7;
const MAX_CELL_WIDTH: u16 = 8;

pub struct HeatmapPanel<'a> {
    heatmap: &'a Result<Heatmap, PipelineError>,
}

impl<'a> HeatmapPanel<'a> {
    pub fn new(heatmap: &'a Result<Heatmap, PipelineError>) -> Self {
        Self { heatmap }
    }
}

impl Widget for HeatmapPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let heatmap = match self.heatmap {
            Ok(h) => h,
            Err(err) => {
                Paragraph::new(format!("Correlation unavailable.\n{err}"))
                    .style(Style::default().fg(Color::Yellow))
                    .wrap(Wrap { trim: true })
                    .block(Block::default().title(" Correlation ").borders(Borders::ALL))
                    .render(area, buf);
                return;
            }
        };

        let block = Block::default()
            .title(format!(" {} ", heatmap.title))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        block.render(area, buf);

        let k = heatmap.size() as u16;
        if k == 0 || inner.width <= ROW_LABEL_WIDTH || inner.height < 2 {
            return;
        }
        let cell_width = ((inner.width - ROW_LABEL_WIDTH) / k).min(MAX_CELL_WIDTH);
        let cell_height = ((inner.height - 1) / k).clamp(1, 2);
        if cell_width < 4 {
            buf.set_string(inner.x, inner.y, "Too narrow", Style::default().fg(Color::Yellow));
            return;
        }

        let label_style = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
        for (j, label) in heatmap.labels.iter().enumerate() {
            let x = inner.x + ROW_LABEL_WIDTH + j as u16 * cell_width;
            buf.set_string(x, inner.y, centered(label, cell_width), label_style);
        }

        for cell in &heatmap.cells {
            let x = inner.x + ROW_LABEL_WIDTH + cell.col as u16 * cell_width;
            let y = inner.y + 1 + cell.row as u16 * cell_height;
            if y + cell_height > inner.y + inner.height {
                continue;
            }
            if cell.col == 0 {
                let label = heatmap.labels.get(cell.row).map(String::as_str).unwrap_or("");
                buf.set_stringn(inner.x, y, label, ROW_LABEL_WIDTH as usize - 1, label_style);
            }

            let fg = if cell.color.luminance() > 0.55 { Color::Black } else { Color::White };
            let style = Style::default().bg(cell.color.to_ratatui()).fg(fg);
            for dy in 0..cell_height {
                let text = if dy == 0 {
                    centered(&cell.annotation, cell_width)
                } else {
                    " ".repeat(cell_width as usize)
                };
                buf.set_string(x, y + dy, text, style);
            }
        }
    }
}

fn centered(text: &str, width: u16) -> String {
    let width = width as usize;
    let text: String = text.chars().take(width).collect();
    format!("{text:^width$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{HeatCell, diverging_color};

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

    fn two_by_two() -> Heatmap {
        let values = [[1.0, -0.42], [-0.42, 1.0]];
        let mut cells = Vec::new();
        for (row, vals) in values.iter().enumerate() {
            for (col, &value) in vals.iter().enumerate() {
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
            labels: vec!["open".to_string(), "close".to_string()],
            cells,
        }
    }

    #[test]
    fn renders_labels_and_annotations() {
        let heatmap = Ok(two_by_two());
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        HeatmapPanel::new(&heatmap).render(area, &mut buf);

        let text = content(&buf, area);
        assert!(text.contains("1.00"));
        assert!(text.contains("-0.42"));
        assert!(text.contains("close"));
    }

    #[test]
    fn error_renders_placeholder() {
        let heatmap = Err(PipelineError::insufficient("correlation (rows)", 2, 1));
        let area = Rect::new(0, 0, 60, 8);
        let mut buf = Buffer::empty(area);
        HeatmapPanel::new(&heatmap).render(area, &mut buf);

        assert!(content(&buf, area).contains("Correlation unavailable."));
    }

    #[test]
    fn centered_pads_and_truncates() {
        assert_eq!(centered("ab", 6), "  ab  ");
        assert_eq!(centered("abcdefgh", 4), "abcd");
    }
}
