//! Ratatui-based terminal UI.
//!
//! The TUI shows one antibody panel at a time: a Plotters chart of percent
//! input per sample across series, the same numbers as a table, and the
//! failed series. The pipeline can be re-run from disk without leaving.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table},
};

use crate::app::pipeline::{RunOutput, run_from_dir};
use crate::domain::ExperimentConfig;
use crate::error::AppError;
use crate::report::{Panel, build_panels, grid_shape};

mod plotters_chart;

use plotters_chart::PanelChart;

/// Start the TUI.
///
/// Log output is switched off until the terminal is restored; failures are
/// shown in the failures pane and the status line instead.
pub fn run(config: ExperimentConfig, data_dir: PathBuf, strict: bool) -> Result<(), AppError> {
    let mut app = App::new(config, data_dir, strict);

    let _quiet = QuietLogs::new();
    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Holds the global `log` level at `Off`, restoring the previous level on drop.
struct QuietLogs(log::LevelFilter);

impl QuietLogs {
    fn new() -> Self {
        let previous = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        Self(previous)
    }
}

impl Drop for QuietLogs {
    fn drop(&mut self) {
        log::set_max_level(self.0);
    }
}

struct App {
    config: ExperimentConfig,
    data_dir: PathBuf,
    strict: bool,
    debug_dir: PathBuf,
    run: Option<RunOutput>,
    panels: Vec<Panel>,
    selected: usize,
    /// All panels at once, laid out on the `grid_shape` grid.
    overview: bool,
    status: String,
}

impl App {
    fn new(config: ExperimentConfig, data_dir: PathBuf, strict: bool) -> Self {
        let mut app = Self {
            config,
            data_dir,
            strict,
            debug_dir: PathBuf::from("debug"),
            run: None,
            panels: Vec::new(),
            selected: 0,
            overview: false,
            status: String::new(),
        };
        app.rerun();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.step_panel(-1),
            KeyCode::Right => self.step_panel(1),
            KeyCode::Char('g') => self.overview = !self.overview,
            KeyCode::Char('r') => self.rerun(),
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }
        false
    }

    fn step_panel(&mut self, delta: isize) {
        let n = self.panels.len();
        if n == 0 {
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(n as isize) as usize;
        self.status = format!(
            "panel {}/{n}: {}",
            self.selected + 1,
            self.panels[self.selected].antibody
        );
    }

    fn rerun(&mut self) {
        match run_from_dir(&self.config, &self.data_dir) {
            Ok(run) => {
                self.panels = build_panels(
                    &run.results(),
                    &self.config.samples,
                    self.config.panel_antibodies(),
                );
                self.selected = self.selected.min(self.panels.len().saturating_sub(1));
                self.status = match run.check(self.strict) {
                    Ok(()) => format!(
                        "{} quantified, {} failed",
                        run.series.len(),
                        run.failures.len()
                    ),
                    Err(err) => err.to_string(),
                };
                self.run = Some(run);
            }
            Err(err) => {
                self.status = err.to_string();
                self.run = None;
                self.panels.clear();
                self.selected = 0;
            }
        }
    }

    fn write_debug(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing to write: no run.".to_string();
            return;
        };
        self.status = match crate::debug::write_debug_bundle(&self.debug_dir, run, &self.config) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(err) => format!("Debug write failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("chipq", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | data: {}", self.data_dir.display())),
        ]));

        let (rows, cols) = grid_shape(self.panels.len());
        let panel = self
            .panels
            .get(self.selected)
            .map(|p| {
                format!(
                    "{} ({}/{}, grid {rows}x{cols})",
                    p.antibody,
                    self.selected + 1,
                    self.panels.len()
                )
            })
            .unwrap_or_else(|| "-".to_string());

        lines.push(Line::from(Span::styled(
            format!(
                "samples: {} | antibodies: {} | replicates: {} | input: {}% | panel: {panel}",
                self.config.samples.len(),
                self.config.antibodies.len(),
                self.config.num_replicates,
                self.config.input_volume,
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        if self.overview {
            self.draw_grid(frame, area);
            return;
        }
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(chunks[1]);

        self.draw_chart(frame, chunks[0]);
        self.draw_table(frame, side[0]);
        self.draw_failures(frame, side[1]);
    }

    fn draw_grid(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (rows, cols) = grid_shape(self.panels.len());
        if rows == 0 {
            frame.render_widget(
                Paragraph::new("No quantified series.").style(Style::default().fg(Color::Yellow)),
                area,
            );
            return;
        }

        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
            .split(area);
        for (r, row_area) in row_areas.iter().enumerate() {
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, cols as u32); cols])
                .split(*row_area);
            for (c, cell) in cells.iter().enumerate() {
                let Some(panel) = self.panels.get(r * cols + c) else {
                    continue;
                };
                let style = if r * cols + c == self.selected {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                let block = Block::default()
                    .title(panel.antibody.clone())
                    .borders(Borders::ALL)
                    .border_style(style);
                let inner = block.inner(*cell);
                frame.render_widget(block, *cell);
                frame.render_widget(PanelChart::from_panel(panel), inner);
            }
        }
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Percent input").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(panel) = self.panels.get(self.selected) else {
            let msg = Paragraph::new("No quantified series.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let legend_height = panel.rows.len().min(6) as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(legend_height)])
            .split(inner);

        frame.render_widget(PanelChart::from_panel(panel), chunks[0]);

        let legend: Vec<Line> = panel
            .rows
            .iter()
            .enumerate()
            .map(|(k, row)| {
                let RGBColor(r, g, b) = plotters_chart::PALETTE[k % plotters_chart::PALETTE.len()];
                Line::from(Span::styled(
                    format!("── {}", row.sample),
                    Style::default().fg(Color::Rgb(r, g, b)),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(legend), chunks[1]);
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(panel) = self.panels.get(self.selected) else {
            frame.render_widget(Block::default().title("Table").borders(Borders::ALL), area);
            return;
        };

        let header = Row::new(
            std::iter::once(Cell::from("sample"))
                .chain(panel.series.iter().map(|s| Cell::from(s.clone()))),
        )
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = panel
            .rows
            .iter()
            .map(|row| {
                let values = row.values.iter().map(|v| {
                    Cell::from(match v {
                        Some(v) => format!("{v:.3}"),
                        None => "-".to_string(),
                    })
                });
                Row::new(std::iter::once(Cell::from(row.sample.clone())).chain(values))
            })
            .collect();

        let widths: Vec<Constraint> = std::iter::once(Constraint::Length(10))
            .chain(panel.series.iter().map(|s| Constraint::Length(s.chars().count().max(7) as u16)))
            .collect();

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(format!("{} (% input)", panel.antibody))
                    .borders(Borders::ALL),
            );
        frame.render_widget(table, area);
    }

    fn draw_failures(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let failures = self.run.as_ref().map(|r| r.failures.as_slice()).unwrap_or_default();
        let items: Vec<ListItem> = if failures.is_empty() {
            vec![ListItem::new("none")]
        } else {
            failures
                .iter()
                .map(|f| ListItem::new(format!("{} [{}] {}", f.series, f.stage, f.source)))
                .collect()
        };
        let list = List::new(items)
            .style(Style::default().fg(if failures.is_empty() { Color::Gray } else { Color::Red }))
            .block(Block::default().title("Failed series").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ panel  g grid  r re-run  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}
