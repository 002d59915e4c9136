//! Reporting utilities: per-antibody panels and formatted terminal output.
//!
//! A panel is one antibody seen across every series: rows are samples,
//! columns are series. Tables, ASCII charts and the TUI all render panels.

pub mod format;

pub use format::*;

use crate::domain::SeriesResults;

/// One antibody across all series.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub antibody: String,
    /// Column labels (series names, in result order).
    pub series: Vec<String>,
    pub rows: Vec<PanelRow>,
}

/// One sample's ratios for a panel; `None` where a series lacks the value.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub sample: String,
    pub values: Vec<Option<f64>>,
}

impl Panel {
    /// Finite (min, max) over every value in the panel.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in self.rows.iter().flat_map(|r| r.values.iter().flatten()) {
            if v.is_finite() {
                min = min.min(*v);
                max = max.max(*v);
            }
        }
        (min.is_finite() && max.is_finite()).then_some((min, max))
    }
}

/// Build one panel per antibody, samples and antibodies in the given order.
pub fn build_panels(
    results: &SeriesResults,
    samples: &[String],
    antibodies: &[String],
) -> Vec<Panel> {
    let series: Vec<String> = results.keys().cloned().collect();

    antibodies
        .iter()
        .map(|antibody| {
            let rows = samples
                .iter()
                .map(|sample| PanelRow {
                    sample: sample.clone(),
                    values: results
                        .values()
                        .map(|ratios| ratios.value(sample, antibody))
                        .collect(),
                })
                .collect();
            Panel {
                antibody: antibody.clone(),
                series: series.clone(),
                rows,
            }
        })
        .collect()
}

/// Grid shape `(rows, cols)` for `n` panels: `cols = round(sqrt(n))`.
pub fn grid_shape(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let cols = ((n as f64).sqrt().round() as usize).max(1);
    let rows = n.div_ceil(cols);
    (rows, cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FinalRatios;

    fn ratios(values: &[(&str, &str, f64)]) -> FinalRatios {
        let mut table = FinalRatios::new();
        for (sample, target, v) in values {
            let mut tv = table.get(sample).cloned().unwrap_or_default();
            tv.insert(*target, *v);
            table.insert(*sample, tv);
        }
        table
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn panels_follow_sample_and_series_order() {
        let mut results = SeriesResults::new();
        results.insert("t1".to_string(), ratios(&[("B", "H3", 0.3), ("A", "H3", 0.1)]));
        results.insert("t0".to_string(), ratios(&[("A", "H3", 0.2)]));

        let panels = build_panels(&results, &names(&["A", "B"]), &names(&["H3"]));
        assert_eq!(panels.len(), 1);
        let p = &panels[0];
        assert_eq!(p.series, ["t0", "t1"]);
        assert_eq!(p.rows[0].sample, "A");
        assert_eq!(p.rows[0].values, [Some(0.2), Some(0.1)]);
        assert_eq!(p.rows[1].values, [None, Some(0.3)]);
        assert_eq!(p.value_range(), Some((0.1, 0.3)));
    }

    #[test]
    fn grid_shape_matches_panel_count() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(2), (2, 1));
        assert_eq!(grid_shape(3), (2, 2));
        assert_eq!(grid_shape(4), (2, 2));
        assert_eq!(grid_shape(6), (3, 2));
        assert_eq!(grid_shape(0), (0, 0));
    }

    #[test]
    fn panel_without_values_has_no_range() {
        let panel = Panel {
            antibody: "H3".to_string(),
            series: vec![],
            rows: vec![PanelRow {
                sample: "A".to_string(),
                values: vec![None],
            }],
        };
        assert_eq!(panel.value_range(), None);
    }
}
