//! Plotters-powered panel chart widget for Ratatui.
//!
//! One line per sample; the x axis is categorical (one slot per series) and
//! the y axis is percent input.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::report::Panel;

/// High-contrast palette, cycled per sample.
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(0, 255, 255),
    RGBColor(0, 255, 0),
    RGBColor(255, 255, 0),
    RGBColor(255, 0, 255),
    RGBColor(255, 96, 96),
    RGBColor(255, 255, 255),
];

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call; see
/// [`PanelChart::from_panel`].
pub struct PanelChart<'a> {
    /// Column labels, one per x slot.
    pub series: &'a [String],
    /// Per sample: contiguous runs of `(series index, ratio)`.
    pub lines: Vec<Vec<Vec<(f64, f64)>>>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: String,
}

impl<'a> PanelChart<'a> {
    pub fn from_panel(panel: &'a Panel) -> Self {
        let lines = panel.rows.iter().map(|row| segments(&row.values)).collect();
        let n = panel.series.len().max(1) as f64;

        let (y_min, y_max) = panel.value_range().unwrap_or((0.0, 1.0));
        let pad = ((y_max - y_min).abs() * 0.05).max(y_max.abs() * 0.05).max(1e-12);

        Self {
            series: &panel.series,
            lines,
            x_bounds: [-0.5, n - 0.5],
            y_bounds: [(y_min - pad).max(0.0), y_max + pad],
            y_label: format!("{} (% input)", panel.antibody),
        }
    }
}

/// Split a row into runs of finite values; gaps break the line.
fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) if v.is_finite() => current.push((i as f64, *v)),
            _ => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Tick label for an x slot; empty between slots.
fn series_label(series: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 0.05 || idx < 0.0 {
        return String::new();
    }
    series.get(idx as usize).cloned().unwrap_or_default()
}

impl<'a> Widget for PanelChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite())
            || x1 <= x0
            || y1 <= y0
        {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(&self.y_label)
                .x_labels(self.series.len().max(2) * 2 + 1)
                .y_labels(5)
                .x_label_formatter(&|v| series_label(self.series, *v))
                .y_label_formatter(&|v| format!("{v:.3}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (k, runs) in self.lines.iter().enumerate() {
                let color = PALETTE[k % PALETTE.len()];
                for run in runs {
                    chart.draw_series(LineSeries::new(run.iter().copied(), &color))?;
                    // `Circle` radii are mis-scaled by the backend; pixels stay crisp.
                    chart.draw_series(run.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
