//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the quantification code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{ExperimentConfig, INPUT_TARGET};
use crate::error::SeriesError;
use crate::report::Panel;

/// Header block: layout, constants and how many series made it through.
pub fn format_run_summary(run: &RunOutput, config: &ExperimentConfig) -> String {
    let mut out = String::new();

    out.push_str("=== chipq - ChIP-qPCR percent input ===\n");
    out.push_str(&format!(
        "Layout: {} samples x {} antibodies (+{INPUT_TARGET}), {} controls, {} replicates\n",
        config.samples.len(),
        config.antibodies.len(),
        config.controls.len(),
        config.num_replicates,
    ));
    out.push_str(&format!(
        "Rows per series: {} | input volume: {}%\n",
        config.expected_row_count(),
        config.input_volume,
    ));
    out.push_str(&format!(
        "Series: {} quantified, {} failed\n",
        run.series.len(),
        run.failures.len(),
    ));

    out
}

/// Format every panel as a table (samples x series).
pub fn format_panels(panels: &[Panel]) -> String {
    let mut out = String::new();
    for panel in panels {
        out.push('\n');
        out.push_str(&format_panel_table(panel));
    }
    out
}

/// Format one panel: a row per sample, a column per series, 3 decimals.
pub fn format_panel_table(panel: &Panel) -> String {
    let sample_w = panel
        .rows
        .iter()
        .map(|r| r.sample.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);
    let col_w: Vec<usize> = panel
        .series
        .iter()
        .map(|s| s.chars().count().max(9))
        .collect();

    let mut out = String::new();
    out.push_str(&format!("{} (% input)\n", panel.antibody));

    let mut line = format!("{:<sample_w$}", "sample");
    for (name, w) in panel.series.iter().zip(&col_w) {
        line.push_str(&format!(" {name:>w$}"));
    }
    out.push_str(line.trim_end());
    out.push('\n');

    let mut line = "-".repeat(sample_w);
    for w in &col_w {
        line.push(' ');
        line.push_str(&"-".repeat(*w));
    }
    out.push_str(&line);
    out.push('\n');

    for row in &panel.rows {
        let mut line = format!("{:<sample_w$}", row.sample);
        for (v, w) in row.values.iter().zip(&col_w) {
            let cell = match v {
                Some(v) => format!("{v:.3}"),
                None => "-".to_string(),
            };
            line.push_str(&format!(" {cell:>w$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// List failed series with their stage and cause.
pub fn format_failures(failures: &[SeriesError]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nFailed series:\n");
    for f in failures {
        out.push_str(&format!("- {} [{}] {}\n", f.series, f.stage, f.source));
    }
    out
}

/// Describe the positional row layout every series file must follow.
pub fn format_layout(config: &ExperimentConfig) -> String {
    let n = config.num_replicates;
    let mut out = String::new();
    out.push_str(&format!(
        "Rows per series: {} = {} x ({} x ({} + 1) + {})\n",
        config.expected_row_count(),
        n,
        config.samples.len(),
        config.antibodies.len(),
        config.controls.len(),
    ));

    let mut first = 1usize;
    let mut push_block = |label: String, count: usize, out: &mut String| {
        let last = first + count - 1;
        out.push_str(&format!("{:>12}  {label}\n", format!("{first}-{last}")));
        first = last + 1;
    };

    for sample in &config.samples {
        for antibody in &config.antibodies {
            push_block(format!("{sample} / {antibody}"), n, &mut out);
        }
        push_block(format!("{sample} / {INPUT_TARGET}"), n, &mut out);
    }
    if !config.controls.is_empty() {
        push_block(
            format!("controls ({}), not averaged", config.controls.join(", ")),
            n * config.controls.len(),
            &mut out,
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::PanelRow;

    #[test]
    fn panel_table_snapshot() {
        let panel = Panel {
            antibody: "H3K4me3".to_string(),
            series: vec!["day0".to_string(), "day1_long_name".to_string()],
            rows: vec![
                PanelRow {
                    sample: "WT".to_string(),
                    values: vec![Some(0.12345), Some(1.5)],
                },
                PanelRow {
                    sample: "KO".to_string(),
                    values: vec![Some(0.02), None],
                },
            ],
        };
        let expected = concat!(
            "H3K4me3 (% input)\n",
            "sample      day0 day1_long_name\n",
            "------ --------- --------------\n",
            "WT         0.123          1.500\n",
            "KO         0.020              -\n",
        );
        assert_eq!(format_panel_table(&panel), expected);
    }

    #[test]
    fn layout_lists_every_block() {
        let config = ExperimentConfig::new(&["A", "B"], &["IgG", "H3"], &["c1"], 2, 2.0);
        let text = format_layout(&config);
        let expected = concat!(
            "Rows per series: 14 = 2 x (2 x (2 + 1) + 1)\n",
            "         1-2  A / IgG\n",
            "         3-4  A / H3\n",
            "         5-6  A / input\n",
            "         7-8  B / IgG\n",
            "        9-10  B / H3\n",
            "       11-12  B / input\n",
            "       13-14  controls (c1), not averaged\n",
        );
        assert_eq!(text, expected);
    }
}
