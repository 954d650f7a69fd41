#![forbid(unsafe_code)]

use labelgraph_core::{EditedBatch, KeySet, Label};
use labelgraph_store::{LabelStore, PrunePolicy};

fn l(key: &str, cat: &str, left: f64, right: f64) -> Label {
    Label::new(key, cat, left, right)
}

fn keys(ks: &[&str]) -> KeySet {
    ks.iter().map(|k| k.to_string()).collect()
}

fn batch(labels: Vec<Label>, deleted: &[&str]) -> EditedBatch {
    EditedBatch { labels, selection: KeySet::new(), deleted: keys(deleted) }
}

#[test]
fn replay_basic_sequence() {
    let mut store = LabelStore::new();

    // create a, then b; update a; delete b
    let out = store.reconcile("g", &batch(vec![l("a", "HOT", 0.0, 10.0)], &[]));
    assert_eq!(out, vec![l("a", "HOT", 0.0, 10.0)]);

    let out = store.reconcile("g", &batch(vec![l("a", "HOT", 0.0, 10.0), l("b", "COLD", 20.0, 30.0)], &[]));
    assert_eq!(out.len(), 2);

    let out = store.reconcile("g", &batch(vec![l("a", "COLD", 0.0, 12.0), l("b", "COLD", 20.0, 30.0)], &[]));
    assert_eq!(out[0], l("a", "COLD", 0.0, 12.0));

    let out = store.reconcile("g", &batch(vec![l("a", "COLD", 0.0, 12.0)], &["b"]));
    assert_eq!(out, vec![l("a", "COLD", 0.0, 12.0)]);
    assert_eq!(store.len(), 1);
    assert!(!store.contains("b"));
}

#[test]
fn deletion_wins_and_result_follows_batch() {
    // store = {a: A, b: B}; batch = {labels: [B'], deleted: [a]}
    let mut store = LabelStore::new();
    store.put("g", l("a", "HOT", 0.0, 1.0));
    store.put("g", l("b", "HOT", 2.0, 3.0));

    let b2 = l("b", "COLD", 2.0, 4.0);
    let out = store.reconcile("g", &batch(vec![b2.clone()], &["a"]));
    assert_eq!(out, vec![b2.clone()]);
    assert!(!store.contains("a"));
    assert_eq!(store.get("g"), vec![b2]);
}

#[test]
fn result_keeps_edit_order_not_bound_order() {
    let mut store = LabelStore::new();
    let out = store.reconcile("g", &batch(vec![l("late", "HOT", 50.0, 60.0), l("early", "COLD", 0.0, 5.0)], &[]));
    assert_eq!(out.iter().map(|x| x.key.as_str()).collect::<Vec<_>>(), vec!["late", "early"]);
}

#[test]
fn deletion_is_idempotent() {
    let mut once = LabelStore::new();
    once.put("g", l("a", "HOT", 0.0, 1.0));
    once.put("g", l("b", "HOT", 2.0, 3.0));
    let mut twice = once.clone();

    let del = batch(vec![l("b", "HOT", 2.0, 3.0)], &["a", "never-seen"]);
    once.reconcile("g", &del);
    twice.reconcile("g", &del);
    twice.reconcile("g", &del);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 1);
}

#[test]
fn absence_is_not_deletion_by_default() {
    let mut store = LabelStore::new();
    store.put("g", l("a", "HOT", 0.0, 1.0));
    store.put("g", l("b", "HOT", 2.0, 3.0));

    let out = store.reconcile("g", &batch(vec![l("b", "HOT", 2.0, 3.0)], &[]));
    assert_eq!(out.len(), 1);
    assert!(store.contains("a"));
    assert_eq!(store.get("g").len(), 2);
}

#[test]
fn prune_absent_drops_missing_group_keys() {
    let mut store = LabelStore::new();
    store.put("g", l("a", "HOT", 0.0, 1.0));
    store.put("g", l("b", "HOT", 2.0, 3.0));
    store.put("other", l("c", "HOT", 4.0, 5.0));

    let r = store.reconcile_with("g", &batch(vec![l("b", "HOT", 2.0, 3.0)], &[]), PrunePolicy::PruneAbsent);
    assert_eq!(r.pruned, 1);
    assert_eq!(r.upserted, 1);
    assert!(!store.contains("a"));
    assert!(store.contains("c"));
}
