//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - x axis: series, evenly spaced in name order
//! - one marker per sample (`*`, `o`, `+`, ...), joined by `.` lines

use crate::report::Panel;

const MARKERS: [char; 6] = ['*', 'o', '+', 'x', '#', '@'];

/// Render every panel, one chart after the other.
pub fn render_panel_charts(panels: &[Panel], width: usize, height: usize) -> String {
    let mut out = String::new();
    for panel in panels {
        out.push('\n');
        out.push_str(&render_panel_chart(panel, width, height));
    }
    out
}

/// Render one antibody panel: ratio per sample across series.
pub fn render_panel_chart(panel: &Panel, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = panel.value_range().unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);
    let n_series = panel.series.len();

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so markers overlay them.
    for row in &panel.rows {
        let mut prev: Option<(usize, usize)> = None;
        for (i, v) in row.values.iter().enumerate() {
            let Some(v) = v.filter(|v| v.is_finite()) else {
                prev = None;
                continue;
            };
            let p = (map_x(i, n_series, width), map_y(v, y_min, y_max, height));
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, p.0, p.1, '.');
            }
            prev = Some(p);
        }
    }

    for (k, row) in panel.rows.iter().enumerate() {
        let marker = MARKERS[k % MARKERS.len()];
        for (i, v) in row.values.iter().enumerate() {
            if let Some(v) = v.filter(|v| v.is_finite()) {
                let x = map_x(i, n_series, width);
                let y = map_y(v, y_min, y_max, height);
                grid[y][x] = marker;
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | series={n_series} | y=[{y_min:.3}, {y_max:.3}] % input\n",
        panel.antibody
    ));

    for row in grid {
        let line: String = row.into_iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if let (Some(first), Some(last)) = (panel.series.first(), panel.series.last()) {
        out.push_str(&format!("x: {first} .. {last}\n"));
    }
    let legend: Vec<String> = panel
        .rows
        .iter()
        .enumerate()
        .map(|(k, r)| format!("{} {}", MARKERS[k % MARKERS.len()], r.sample))
        .collect();
    out.push_str(&format!("legend: {}\n", legend.join("  ")));

    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 {
        span * frac
    } else {
        (min.abs() * frac).max(1e-12)
    };
    (min - pad, max + pad)
}

fn map_x(i: usize, n: usize, width: usize) -> usize {
    if n <= 1 {
        return (width - 1) / 2;
    }
    let u = i as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
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
