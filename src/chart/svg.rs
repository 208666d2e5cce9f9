//! SVG export of chart artifacts via Plotters' SVG backend.

use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tracing::info;

use crate::chart::{ChartArtifacts, ChartStyle};
use crate::error::AppError;

pub const SVG_SIZE: (u32, u32) = (1024, 576);
pub const HEATMAP_SVG_SIZE: (u32, u32) = (640, 600);

type SvgResult = Result<(), DrawingAreaErrorKind<std::io::Error>>;

/// Render `draw` onto a white SVG canvas at `path`.
pub fn write_svg<F>(path: &Path, size: (u32, u32), draw: F) -> Result<(), AppError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> SvgResult,
{
    let root = SVGBackend::new(path, size).into_drawing_area();
    let fail = |e: String| AppError::runtime(format!("Failed to render SVG '{}': {e}", path.display()));

    root.fill(&WHITE).map_err(|e| fail(e.to_string()))?;
    draw(&root).map_err(|e| fail(e.to_string()))?;
    root.present().map_err(|e| fail(e.to_string()))?;
    Ok(())
}

/// Write the line, candlestick and (when defined) heatmap charts into `dir`.
///
/// Returns the paths written.
pub fn write_chart_svgs(dir: &Path, ticker: &str, charts: &ChartArtifacts) -> Result<Vec<PathBuf>, AppError> {
    let style = ChartStyle::svg();
    let mut written = Vec::new();

    let line_path = dir.join(format!("{ticker}_line.svg"));
    write_svg(&line_path, SVG_SIZE, |root| charts.line.draw(root, &style))?;
    written.push(line_path);

    let candle_path = dir.join(format!("{ticker}_candlestick.svg"));
    write_svg(&candle_path, SVG_SIZE, |root| charts.candlestick.draw(root, &style))?;
    written.push(candle_path);

    if let Ok(heatmap) = &charts.heatmap {
        let heatmap_path = dir.join(format!("{ticker}_correlation.svg"));
        write_svg(&heatmap_path, HEATMAP_SVG_SIZE, |root| heatmap.draw(root, &style))?;
        written.push(heatmap_path);
    }

    info!(count = written.len(), dir = %dir.display(), "wrote chart SVGs");
    Ok(written)
}
