//! Tests for the explode/implode pair

use maplayers::application::services::{explode, implode};
use maplayers::domain::{Layer, LayerKind};

fn leaf(name: &str) -> Layer {
    Layer::new("t", name, LayerKind::Group)
}

fn two_leaf_root() -> Layer {
    let mut b = leaf("b");
    b.visibility = false;
    b.opacity = 128;
    Layer::group("t", "root", vec![leaf("a"), b])
}

#[test]
fn given_nested_forest_when_exploding_then_one_entry_per_leaf_with_paths() {
    // Arrange
    let forest = vec![two_leaf_root()];

    // Act
    let exploded = explode(&forest);

    // Assert
    assert_eq!(exploded.len(), 2);
    assert_eq!(exploded[0].path, vec![0]);
    assert_eq!(exploded[1].path, vec![1]);
    assert_eq!(exploded[0].layer.name, "root");
    assert_eq!(exploded[0].leaf().name, "a");
    assert_eq!(exploded[1].leaf().name, "b");
    // Each entry carries a single-child chain copy of the root
    assert_eq!(exploded[1].layer.sublayers.as_ref().unwrap().len(), 1);
}

#[test]
fn given_leafless_root_when_exploding_then_single_entry_with_empty_path() {
    // Arrange
    let forest = vec![leaf("solo")];

    // Act
    let exploded = explode(&forest);

    // Assert
    assert_eq!(exploded.len(), 1);
    assert!(exploded[0].path.is_empty());
    assert_eq!(exploded[0].leaf().name, "solo");
}

#[test]
fn given_empty_group_below_root_when_exploding_then_group_is_pruned() {
    // Arrange
    let empty_group = Layer::group("t", "empty", Vec::new());
    let forest = vec![Layer::group("t", "root", vec![empty_group, leaf("a")])];

    // Act
    let exploded = explode(&forest);

    // Assert
    assert_eq!(exploded.len(), 1);
    assert_eq!(exploded[0].leaf().name, "a");
    assert_eq!(exploded[0].path, vec![1]);
}

#[test]
fn given_forest_when_round_tripping_then_leaves_and_attributes_preserved() {
    // Arrange
    let nested = Layer::group(
        "t",
        "root",
        vec![
            leaf("a"),
            Layer::group("t", "g", vec![leaf("b"), leaf("c")]),
        ],
    );
    let forest = vec![nested];
    let before: Vec<_> = explode(&forest)
        .iter()
        .map(|e| {
            let l = e.leaf();
            (l.name.clone(), l.visibility, l.opacity)
        })
        .collect();

    // Act
    let imploded = implode(explode(&forest), false);

    // Assert
    assert_eq!(imploded.len(), 1);
    let after: Vec<_> = explode(&imploded)
        .iter()
        .map(|e| {
            let l = e.leaf();
            (l.name.clone(), l.visibility, l.opacity)
        })
        .collect();
    assert_eq!(after, before);
    let subs = imploded[0].sublayers.as_ref().unwrap();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[1].name, "g");
    assert_eq!(subs[1].sublayers.as_ref().unwrap().len(), 2);
}

#[test]
fn given_round_trip_when_imploding_then_uuids_are_unique() {
    // Arrange
    let forest = vec![two_leaf_root()];

    // Act
    let imploded = implode(explode(&forest), false);

    // Assert
    let entries = explode(&imploded);
    let a = entries[0].leaf().uuid;
    let b = entries[1].leaf().uuid;
    assert_ne!(a, b);
    assert_ne!(entries[0].layer.uuid, a);
}

#[test]
fn given_entries_of_distinct_roots_when_imploding_then_roots_stay_separate() {
    // Arrange
    let forest = vec![
        Layer::group("t", "root", vec![leaf("a")]),
        Layer::group("u", "other", vec![leaf("b")]),
    ];

    // Act
    let imploded = implode(explode(&forest), false);

    // Assert
    assert_eq!(imploded.len(), 2);
    assert_eq!(imploded[0].id, "t");
    assert_eq!(imploded[1].id, "u");
}

#[test]
fn given_swipe_active_when_imploding_then_first_entry_is_isolated() {
    // Arrange
    let forest = vec![two_leaf_root()];
    let exploded = explode(&forest);

    // Act
    let swiped = implode(exploded.clone(), true);
    let merged = implode(exploded, false);

    // Assert
    assert_eq!(swiped.len(), 2);
    assert_eq!(merged.len(), 1);
    // The isolated first entry keeps its single-leaf chain
    assert_eq!(swiped[0].sublayers.as_ref().unwrap().len(), 1);
}

#[test]
fn given_matching_group_names_when_imploding_then_chains_merge_into_one_group() {
    // Arrange
    let forest = vec![Layer::group(
        "t",
        "root",
        vec![Layer::group("t", "g", vec![leaf("a"), leaf("b")])],
    )];

    // Act
    let imploded = implode(explode(&forest), false);

    // Assert
    assert_eq!(imploded.len(), 1);
    let group = &imploded[0].sublayers.as_ref().unwrap()[0];
    assert_eq!(group.name, "g");
    let names: Vec<_> = group
        .sublayers
        .as_ref()
        .unwrap()
        .iter()
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}
