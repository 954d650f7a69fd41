#![forbid(unsafe_code)]

use chrono::{NaiveDate, NaiveDateTime};
use labelgraph_codec::{decode_response, encode_request, CodecError, Inbound};
use labelgraph_core::{AxisDomain, AxisValue, Category, Figure, Label, LabelConfig};
use serde_json::{json, Map, Value};

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn config() -> LabelConfig {
    LabelConfig {
        categories: vec![
            Category { key: "HOT".into(), color: "rgba(255,110,110,0.1)".into() },
            Category { key: "COLD".into(), color: "rgba(110,110,255,0.1)".into() },
        ],
    }
}

fn temporal_figure() -> Figure {
    Figure::from_json(json!({"data": [{"x": ["2022-01-01", "2022-01-02"], "y": [0.1, 0.2], "xaxis": "x"}]})).unwrap()
}

#[test]
fn time_bounds_survive_the_surface() {
    let labels = vec![Label::new("test-01", "HOT", day(2022, 2, 1), day(2022, 6, 1))];
    let req = encode_request(&temporal_figure(), &Map::new(), &config(), &labels).unwrap();

    let wire: Value = serde_json::from_str(&req.labels).unwrap();
    assert_eq!(wire[0]["left"], json!(1_643_673_600_000.0));
    assert_eq!(wire[0]["key"], json!("test-01"));

    // the surface echoes the labels back untouched
    let response = json!({"labels": wire, "selection": ["test-01"], "deleted": []});
    let inbound = Inbound { prior: &labels, domain: Some(AxisDomain::Temporal), strict: None };
    let batch = decode_response(Some(response), &inbound).unwrap();
    assert_eq!(batch.labels, labels);
    assert_eq!(batch.selection.as_slice(), ["test-01".to_string()]);
}

#[test]
fn request_documents_are_json_text() {
    let req = encode_request(&temporal_figure(), &Map::new(), &config(), &[]).unwrap();
    let spec: Value = serde_json::from_str(&req.plotly_spec).unwrap();
    assert_eq!(spec["data"][0]["xaxis"], json!("x"));
    let opts: Value = serde_json::from_str(&req.plotly_config).unwrap();
    assert_eq!(opts, json!({"showLink": false, "linkText": false}));
    let cfg: Value = serde_json::from_str(&req.config).unwrap();
    assert_eq!(cfg["categories"][1]["key"], json!("COLD"));
    assert_eq!(req.labels, "[]");
}

#[test]
fn missing_value_substitutes_prior_state() {
    let prior = vec![Label::new("a", "HOT", 10.0, 20.0), Label::new("b", "COLD", 30.0, 40.0)];
    let inbound = Inbound { prior: &prior, domain: Some(AxisDomain::Numeric), strict: None };
    let batch = decode_response(None, &inbound).unwrap();
    assert_eq!(batch.labels, prior);
    assert!(batch.selection.is_empty());
    assert!(batch.deleted.is_empty());

    // partially filled response: lists default to empty, never absent
    let batch = decode_response(Some(json!({"labels": []})), &inbound).unwrap();
    assert!(batch.labels.is_empty());
    assert!(batch.selection.is_empty() && batch.deleted.is_empty());
}

#[test]
fn native_values_pass_through_in_temporal_domain() {
    let response = json!({"labels": [
        {"key": "x", "category": "COLD", "left": "2022-09-01T00:00:00", "right": 1_669_852_800_000u64, "group": "test1"}
    ]});
    let inbound = Inbound { prior: &[], domain: Some(AxisDomain::Temporal), strict: None };
    let batch = decode_response(Some(response), &inbound).unwrap();
    assert_eq!(batch.labels[0].left, AxisValue::Time(day(2022, 9, 1)));
    assert_eq!(batch.labels[0].right, AxisValue::Time(day(2022, 12, 1)));
}

#[test]
fn numeric_domain_keeps_numbers() {
    let response = json!({"labels": [{"key": "a", "category": "HOT", "left": 10, "right": 20.5}], "deleted": ["z"]});
    let inbound = Inbound { prior: &[], domain: Some(AxisDomain::Numeric), strict: None };
    let batch = decode_response(Some(response), &inbound).unwrap();
    assert_eq!(batch.labels[0], Label::new("a", "HOT", 10.0, 20.5));
    assert_eq!(batch.deleted.as_slice(), ["z".to_string()]);
}

#[test]
fn strict_categories_reject_unknown() {
    let cfg = config();
    let response = json!({"labels": [{"key": "a", "category": "WARM", "left": 1, "right": 2}]});
    let permissive = Inbound { prior: &[], domain: None, strict: None };
    assert!(decode_response(Some(response.clone()), &permissive).is_ok());

    let strict = Inbound { prior: &[], domain: None, strict: Some(&cfg) };
    match decode_response(Some(response), &strict) {
        Err(CodecError::UnknownCategory { key, category }) => {
            assert_eq!(key, "a");
            assert_eq!(category, "WARM");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn strict_mode_leaves_substituted_prior_labels_alone() {
    let cfg = config();
    let prior = vec![Label::new("a", "LEGACY", 1.0, 2.0)];
    let strict = Inbound { prior: &prior, domain: Some(AxisDomain::Numeric), strict: Some(&cfg) };

    let batch = decode_response(None, &strict).unwrap();
    assert_eq!(batch.labels, prior);

    // response without a labels field keeps the prior set, unchecked
    let batch = decode_response(Some(json!({"selection": ["a"]})), &strict).unwrap();
    assert_eq!(batch.labels, prior);
    assert_eq!(batch.selection.as_slice(), ["a".to_string()]);

    // the same category coming back from the surface is still rejected
    let echoed = json!({"labels": [{"key": "a", "category": "LEGACY", "left": 1, "right": 2}]});
    assert!(matches!(decode_response(Some(echoed), &strict), Err(CodecError::UnknownCategory { .. })));
}
