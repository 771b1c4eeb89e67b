use super::common::*;
use crate::scoring::{AggregationKind, Direction, EditPolicy, SignalId, SignalTree, TreeError};

fn top_level(tree: &SignalTree) -> Vec<SignalId> {
    tree.root_signals().to_vec()
}

#[test]
fn starter_tree_scores_the_mean_of_its_two_signals() {
    let tree = SignalTree::starter(EditPolicy::default());

    let names: Vec<_> = tree
        .signals()
        .iter()
        .map(|signal| signal.name.clone())
        .collect();
    assert_eq!(names, vec!["Signal 1", "Signal 2"]);
    assert_close(tree.recompute().score, 0.6);
}

#[test]
fn added_signals_get_default_name_value_and_weight() {
    let mut tree = SignalTree::starter(EditPolicy::default());

    let id = tree.add_signal(None).expect("signal added");

    let view = tree.node(&id).expect("node exists");
    assert_eq!(view.name, "Signal 3");
    assert_eq!(view.value, Some(0.5));
    assert_eq!(view.weight, 1.0);
    assert_eq!(view.parent, None);
    assert_close(tree.recompute().score, (0.7 + 0.5 + 0.5) / 3.0);
}

#[test]
fn cannot_add_under_a_leaf() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let leaf = top_level(&tree)[0].clone();

    assert_eq!(
        tree.add_signal(Some(&leaf)),
        Err(TreeError::NotAFormula(leaf))
    );
}

#[test]
fn converting_a_leaf_seeds_two_sub_signals_with_its_value() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();

    tree.convert_to_formula(&first).expect("converts");

    let view = tree.node(&first).expect("node exists");
    assert_eq!(view.kind, Some(AggregationKind::ArithmeticMean));
    assert_eq!(view.value, None);
    assert_eq!(view.children.len(), 2);

    let subtree = tree.subtree(&first).expect("subtree");
    let seeded: Vec<_> = subtree
        .children()
        .iter()
        .map(|child| (child.name.as_str(), child.value(), child.weight))
        .collect();
    assert_eq!(
        seeded,
        vec![
            ("Sub-Signal 1", Some(0.7), 1.0),
            ("Sub-Signal 2", Some(0.7), 1.0)
        ]
    );
    assert_close(tree.recompute().score, 0.6);
}

#[test]
fn converting_a_zero_leaf_seeds_the_default_value_and_restores_weight() {
    let mut tree = SignalTree::new(AggregationKind::ArithmeticMean, EditPolicy::default());
    let id = tree.add_signal(None).expect("added");
    tree.set_value(&id, 0.0).expect("value set");
    tree.set_weight(&id, 0.0).expect("weight set");

    tree.convert_to_formula(&id).expect("converts");

    let subtree = tree.subtree(&id).expect("subtree");
    assert_eq!(subtree.weight, 1.0);
    assert!(subtree
        .children()
        .iter()
        .all(|child| child.value() == Some(0.5)));
}

#[test]
fn converting_a_formula_to_formula_is_a_no_op() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();
    tree.convert_to_formula(&first).expect("converts");
    let before = tree.subtree(&first).expect("subtree");

    tree.convert_to_formula(&first).expect("no-op");

    assert_eq!(tree.subtree(&first).expect("subtree"), before);
    assert_eq!(tree.len(), 4);
}

#[test]
fn converting_back_to_a_leaf_keeps_the_resolved_score_and_drops_children() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();
    tree.convert_to_formula(&first).expect("converts");
    let children = tree.node(&first).expect("node").children.to_vec();
    tree.set_value(&children[0], 0.2).expect("value set");
    tree.set_value(&children[1], 0.6).expect("value set");

    tree.convert_to_leaf(&first).expect("collapses");

    let view = tree.node(&first).expect("node exists");
    assert_eq!(view.kind, None);
    assert_close(view.value.expect("leaf value"), 0.4);
    assert!(tree.node(&children[0]).is_none());
    assert!(tree.node(&children[1]).is_none());
    assert_eq!(tree.len(), 2);
}

#[test]
fn nested_edits_flow_into_the_root_score() {
    let mut tree = SignalTree::new(AggregationKind::ProbabilisticOr, EditPolicy::default());
    let outer = tree.add_signal(None).expect("added");
    tree.convert_to_formula(&outer).expect("converts");
    tree.set_kind(&outer, AggregationKind::HarmonicMean).expect("kind set");
    let inner = tree.add_signal(Some(&outer)).expect("nested add");
    assert_eq!(tree.node(&inner).expect("node").name, "Signal 3");
    tree.set_value(&inner, 0.0).expect("value set");

    // harmonic mean over {0.5, 0.5, 0.0} skips the zero
    assert_close(tree.recompute().score, 0.5);

    tree.set_root_kind(AggregationKind::ArithmeticMean);
    assert_eq!(tree.recompute().formula_type, AggregationKind::ArithmeticMean);
}

#[test]
fn set_kind_requires_a_formula() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();

    assert_eq!(
        tree.set_kind(&first, AggregationKind::HarmonicMean),
        Err(TreeError::NotAFormula(first))
    );
}

#[test]
fn set_value_requires_a_leaf() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();
    tree.convert_to_formula(&first).expect("converts");

    assert_eq!(
        tree.set_value(&first, 0.3),
        Err(TreeError::NotALeaf(first))
    );
}

#[test]
fn edits_are_validated_against_the_policy() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();

    assert_eq!(
        tree.set_weight(&first, -1.0),
        Err(TreeError::InvalidWeight {
            weight: -1.0,
            max: 5.0
        })
    );
    assert!(matches!(
        tree.set_weight(&first, 5.5),
        Err(TreeError::InvalidWeight { .. })
    ));
    assert!(matches!(
        tree.set_weight(&first, f64::NAN),
        Err(TreeError::InvalidWeight { .. })
    ));
    assert_eq!(tree.set_value(&first, 1.2), Err(TreeError::InvalidValue(1.2)));
    assert!(matches!(
        tree.set_value(&first, f64::INFINITY),
        Err(TreeError::InvalidValue(_))
    ));

    assert_eq!(tree.node(&first).expect("node").value, Some(0.7));
    assert_eq!(tree.node(&first).expect("node").weight, 1.0);
}

#[test]
fn open_policy_accepts_out_of_range_values() {
    let mut tree = SignalTree::new(AggregationKind::ArithmeticMean, open_policy());
    let a = tree.add_signal(None).expect("added");
    let b = tree.add_signal(None).expect("added");
    tree.set_value(&a, 2.0).expect("value set");
    tree.set_value(&b, 4.0).expect("value set");
    tree.set_weight(&b, 20.0).expect("weight set");

    assert_close(tree.recompute().score, (2.0 + 80.0) / 21.0);
}

#[test]
fn unknown_ids_are_reported() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let ghost = SignalId::from("ghost");

    assert_eq!(
        tree.rename(&ghost, "Boo"),
        Err(TreeError::UnknownSignal(ghost.clone()))
    );
    assert_eq!(
        tree.remove(&ghost),
        Err(TreeError::UnknownSignal(ghost.clone()))
    );
    assert_eq!(
        tree.move_signal(&ghost, Direction::Up),
        Err(TreeError::UnknownSignal(ghost.clone()))
    );
    assert_eq!(
        tree.subtree(&ghost),
        Err(TreeError::UnknownSignal(ghost))
    );
}

#[test]
fn removing_a_formula_discards_its_descendants() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();
    tree.convert_to_formula(&first).expect("converts");
    let child = tree.node(&first).expect("node").children[0].clone();
    tree.convert_to_formula(&child).expect("converts nested");
    assert_eq!(tree.len(), 6);

    tree.remove(&first).expect("removed");

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.root_signals().len(), 1);
    assert_close(tree.recompute().score, 0.5);
}

#[test]
fn removing_a_nested_signal_only_touches_its_parent() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();
    tree.convert_to_formula(&first).expect("converts");
    let children = tree.node(&first).expect("node").children.to_vec();

    tree.remove(&children[0]).expect("removed");

    assert_eq!(tree.node(&first).expect("node").children, &children[1..]);
    assert_eq!(tree.root_signals().len(), 2);
}

#[test]
fn moving_reorders_siblings_and_stops_at_the_ends() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let third = tree.add_signal(None).expect("added");
    let before = top_level(&tree);

    tree.move_signal(&third, Direction::Up).expect("moved");
    assert_eq!(
        top_level(&tree),
        vec![before[0].clone(), third.clone(), before[1].clone()]
    );

    tree.move_signal(&before[0], Direction::Up).expect("no-op at top");
    tree.move_signal(&before[1], Direction::Down).expect("no-op at bottom");
    assert_eq!(
        top_level(&tree),
        vec![before[0].clone(), third, before[1].clone()]
    );
}

#[test]
fn reordering_never_changes_the_score() {
    let mut tree = SignalTree::new(AggregationKind::ProbabilisticOr, EditPolicy::default());
    let a = tree.add_signal(None).expect("added");
    let b = tree.add_signal(None).expect("added");
    tree.set_value(&a, 0.1).expect("value set");
    tree.set_weight(&b, 3.0).expect("weight set");
    let before = tree.recompute().score;

    tree.move_signal(&b, Direction::Up).expect("moved");

    assert_close(tree.recompute().score, before);
}

#[test]
fn renaming_only_changes_presentation() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();
    let before = tree.recompute().score;

    tree.rename(&first, "Latency").expect("renamed");

    assert_eq!(tree.node(&first).expect("node").name, "Latency");
    assert_eq!(tree.recompute().score, before);
}

#[test]
fn recompute_handles_trees_nested_a_hundred_thousand_levels_deep() {
    let mut tree = SignalTree::starter(EditPolicy::default());
    let first = top_level(&tree)[0].clone();

    let mut current = first.clone();
    for _ in 0..100_000 {
        tree.convert_to_formula(&current).expect("converted");
        current = tree.node(&current).expect("node").children[0].clone();
    }
    assert_eq!(tree.len(), 200_002);

    assert_close(tree.recompute().score, 0.6);
    assert_close(tree.subtree(&first).expect("subtree").weight, 1.0);

    tree.convert_to_leaf(&first).expect("collapsed");
    assert_eq!(tree.len(), 2);
    assert_close(tree.node(&first).expect("node").value.expect("leaf"), 0.7);
}
