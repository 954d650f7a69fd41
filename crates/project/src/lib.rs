//! Label graph projection: map each axis sample to the category of the label
//! containing it.
//!
//! Labels are applied in list order and later labels overwrite earlier ones, so
//! where intervals overlap the last label in the list wins. Bounds are inclusive.

#![forbid(unsafe_code)]

use labelgraph_core::{AxisValue, CategorySeries, Column, Frame, FrameError, Label, LabelResult};
use tracing::debug;

pub const DEFAULT_OUTPUT_COLUMN: &str = "label";

/// One entry per sample, same order as `axis`.
pub fn project(labels: &[Label], axis: &[AxisValue]) -> CategorySeries {
    let mut out: CategorySeries = vec![None; axis.len()];
    for label in labels {
        for (slot, v) in out.iter_mut().zip(axis) {
            if label.contains(v) {
                *slot = Some(label.category.clone());
            }
        }
    }
    debug!(samples = axis.len(), labels = labels.len(), covered = covered(&out), "projected labels");
    out
}

/// Number of categorized samples.
pub fn covered(series: &CategorySeries) -> usize {
    series.iter().filter(|c| c.is_some()).count()
}

/// Copy of `frame` with a category column derived from `result.labels` against
/// `axis_column`. The output column defaults to [`DEFAULT_OUTPUT_COLUMN`] and
/// replaces an existing column of the same name.
pub fn apply_label_column(
    frame: &Frame,
    result: &LabelResult,
    axis_column: &str,
    output_column: Option<&str>,
) -> Result<Frame, FrameError> {
    let axis = frame.axis(axis_column)?;
    let series = project(&result.labels, axis);
    frame.clone().with_column(output_column.unwrap_or(DEFAULT_OUTPUT_COLUMN), Column::Category(series))
}

/// One sub-frame per label holding the rows inside `[left, right]`, in label order.
pub fn slice_by_labels(frame: &Frame, labels: &[Label], axis_column: &str) -> Result<Vec<Frame>, FrameError> {
    let axis = frame.axis(axis_column)?;
    labels
        .iter()
        .map(|label| {
            let mask: Vec<bool> = axis.iter().map(|v| label.contains(v)).collect();
            frame.filter_rows(&mask)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(v: &[f64]) -> Vec<AxisValue> {
        v.iter().copied().map(AxisValue::Number).collect()
    }

    #[test]
    fn later_label_wins_on_overlap() {
        let labels = vec![Label::new("h", "HOT", 0.0, 10.0), Label::new("c", "COLD", 5.0, 15.0)];
        let out = project(&labels, &nums(&[7.0, 2.0, 20.0]));
        assert_eq!(out, vec![Some("COLD".into()), Some("HOT".into()), None]);

        // reversing the list flips the overlap winner
        let rev: Vec<Label> = labels.into_iter().rev().collect();
        assert_eq!(project(&rev, &nums(&[7.0]))[0].as_deref(), Some("HOT"));
    }

    #[test]
    fn single_interval_scenario() {
        let labels = vec![Label::new("a", "HOT", 10.0, 20.0)];
        assert_eq!(project(&labels, &nums(&[5.0, 15.0, 25.0])), vec![None, Some("HOT".into()), None]);
    }

    #[test]
    fn bounds_are_inclusive() {
        let labels = vec![Label::new("a", "HOT", 10.0, 20.0)];
        let out = project(&labels, &nums(&[10.0, 20.0]));
        assert_eq!(covered(&out), 2);
    }

    #[test]
    fn empty_inputs() {
        assert!(project(&[Label::new("a", "HOT", 0.0, 1.0)], &[]).is_empty());
        assert_eq!(project(&[], &nums(&[1.0, 2.0])), vec![None, None]);
    }

    #[test]
    fn inverted_bounds_match_nothing() {
        let labels = vec![Label::new("a", "HOT", 20.0, 10.0)];
        assert_eq!(covered(&project(&labels, &nums(&[10.0, 15.0, 20.0]))), 0);
    }
}
