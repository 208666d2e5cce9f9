//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - close: `#` line
//! - moving averages: `+`, `x`, `o`, `~`, `=` in window order
//!
//! Earlier traces win where lines overlap, so the close line is never hidden.

use crate::chart::LineChart;

const TRACE_MARKS: [char; 6] = ['#', '+', 'x', 'o', '~', '='];

/// Render a line chart artifact into a `width` x `height` character grid.
pub fn render_ascii_line_chart(chart: &LineChart, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let [x_min, x_max] = chart.x_bounds;
    let [y_min, y_max] = chart.y_bounds;

    let mut grid = vec![vec![' '; width]; height];
    for (k, trace) in chart.traces.iter().enumerate() {
        let mark = TRACE_MARKS[k.min(TRACE_MARKS.len() - 1)];
        draw_curve(&mut grid, &trace.points, [x_min, x_max], [y_min, y_max], mark);
    }

    let mut out = String::new();
    let span = match (chart.dates.first(), chart.dates.last()) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => "no data".to_string(),
    };
    out.push_str(&format!(
        "Plot: {} | {span} | y=[{y_min:.2}, {y_max:.2}]\n",
        chart.title
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let legend: Vec<String> = chart
        .traces
        .iter()
        .enumerate()
        .map(|(k, t)| format!("{} {}", TRACE_MARKS[k.min(TRACE_MARKS.len() - 1)], t.label))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join("  ")));

    out
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let span = x_max - x_min;
    let u = if span > 0.0 { ((x - x_min) / span).clamp(0.0, 1.0) } else { 0.0 };
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let span = y_max - y_min;
    let u = if span > 0.0 { ((y - y_min) / span).clamp(0.0, 1.0) } else { 0.5 };
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], points: &[(f64, f64)], xb: [f64; 2], yb: [f64; 2], ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in points {
        let cx = map_x(x, xb[0], xb[1], width);
        let cy = map_y(y, yb[0], yb[1], height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, cx, cy, ch);
        } else if grid[cy][cx] == ' ' {
            grid[cy][cx] = ch;
        }
        prev = Some((cx, cy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
