//! Label graph core types: categories, interval labels, edit batches and results.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod axis;
pub mod figure;
pub mod frame;

pub use axis::{Axis, AxisDomain, AxisValue};
pub use figure::Figure;
pub use frame::{Column, Frame, FrameError};

/// Caller-chosen partition of a label store.
pub type Group = String;

/// Keys carried by `selection` / `deleted`; usually a handful.
pub type KeySet = SmallVec<[String; 4]>;

/// One derived category per axis sample; `None` means uncategorized.
pub type CategorySeries = Vec<Option<String>>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed chart: {0}")]
    MalformedChart(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    /// Display token for the editing surface (e.g. an rgba string); never interpreted.
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub categories: Vec<Category>,
}

impl LabelConfig {
    pub fn has_category(&self, key: &str) -> bool {
        self.categories.iter().any(|c| c.key == key)
    }
}

/// A category assigned to the closed range `[left, right]`.
///
/// `key` is assigned by the editing surface and is the label's identity across
/// edits; equal bounds do not make two labels the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub category: String,
    pub left: AxisValue,
    pub right: AxisValue,
}

impl Label {
    pub fn new(key: impl Into<String>, category: impl Into<String>, left: impl Into<AxisValue>, right: impl Into<AxisValue>) -> Self {
        Self { key: key.into(), category: category.into(), left: left.into(), right: right.into() }
    }

    /// Inclusive on both ends; false across domains.
    pub fn contains(&self, v: &AxisValue) -> bool {
        self.left <= *v && *v <= self.right
    }
}

/// What the editing surface hands back after one interaction.
///
/// `labels` is the complete current set, not a diff. `selection` is UI state and
/// passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditedBatch {
    pub labels: Vec<Label>,
    pub selection: KeySet,
    pub deleted: KeySet,
}

impl EditedBatch {
    /// The batch assumed when the surface has not answered yet.
    pub fn seeded(labels: Vec<Label>) -> Self {
        Self { labels, selection: KeySet::new(), deleted: KeySet::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelResult {
    pub labels: Vec<Label>,
    pub selection: KeySet,
    pub deleted: KeySet,
    pub series: Option<CategorySeries>,
}

impl LabelResult {
    pub fn from_batch(batch: EditedBatch, series: Option<CategorySeries>) -> Self {
        Self { labels: batch.labels, selection: batch.selection, deleted: batch.deleted, series }
    }
}

pub mod prelude {
    pub use super::{
        Axis, AxisDomain, AxisValue, Category, CategorySeries, Column, CoreError, EditedBatch, Figure, Frame,
        FrameError, Group, KeySet, Label, LabelConfig, LabelResult,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive() {
        let l = Label::new("a", "HOT", 10.0, 20.0);
        assert!(l.contains(&AxisValue::Number(10.0)));
        assert!(l.contains(&AxisValue::Number(20.0)));
        assert!(!l.contains(&AxisValue::Number(20.5)));
        assert!(!l.contains(&AxisValue::Number(f64::NAN)));
    }

    #[test]
    fn native_label_serde_keeps_domain() {
        let t = chrono::NaiveDate::from_ymd_opt(2022, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let l = Label::new("test-01", "HOT", t, t);
        let v = serde_json::to_value(&l).unwrap();
        assert_eq!(v["left"], serde_json::json!("2022-02-01T00:00:00"));
        let back: Label = serde_json::from_value(v).unwrap();
        assert_eq!(back, l);

        let n = Label::new("n", "COLD", 1.5, 2.0);
        let back: Label = serde_json::from_value(serde_json::to_value(&n).unwrap()).unwrap();
        assert_eq!(back, n);
    }

    #[test]
    fn label_bounds_read_any_timestamp_form() {
        let t = chrono::NaiveDate::from_ymd_opt(2022, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        for left in ["2022-02-01", "2022-02-01 00:00:00", "2022-02-01T00:00:00Z", "2022-02-01T01:00:00+01:00"] {
            let v = serde_json::json!({"key": "k", "category": "HOT", "left": left, "right": 1643673600000u64});
            let l: Label = serde_json::from_value(v).unwrap();
            assert_eq!(l.left, AxisValue::Time(t), "{left}");
            assert_eq!(l.right, AxisValue::Number(1_643_673_600_000.0));
        }

        let bad = serde_json::json!({"key": "k", "category": "HOT", "left": "soon", "right": 1});
        assert!(serde_json::from_value::<Label>(bad).is_err());
        let bad = serde_json::json!({"key": "k", "category": "HOT", "left": true, "right": 1});
        assert!(serde_json::from_value::<Label>(bad).is_err());
    }

    #[test]
    fn config_lookup() {
        let cfg: LabelConfig = serde_json::from_value(serde_json::json!({
            "categories": [{"key": "HOT", "color": "rgba(255,110,110,0.1)"}]
        }))
        .unwrap();
        assert!(cfg.has_category("HOT"));
        assert!(!cfg.has_category("COLD"));
    }
}
