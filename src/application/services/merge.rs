//! Merging a freshly loaded capability tree into an existing layer

use std::collections::HashSet;

use tracing::debug;

use crate::application::services::explode::{explode, implode};
use crate::domain::entities::Layer;
use crate::domain::tree::{assign_uuids, collect_sublayer_names};

/// Merge the sublayers of `addition` into `base`.
///
/// The addition's root attributes are discarded; only its subtree
/// matters. Leaves whose name already occurs anywhere in `base` are
/// dropped, the surviving ones are placed in front of the existing
/// leaves and the result is re-imploded into a single tree. `base` wins
/// every conflict.
pub fn merge_sublayers(base: &Layer, addition: &Layer, swipe_active: bool) -> Layer {
    let mut addition_root = base.shell();
    addition_root.sublayers = addition.sublayers.clone();
    assign_uuids(&mut addition_root, &mut HashSet::new());
    if !addition_root.has_sublayers() {
        return base.clone();
    }
    if !base.has_sublayers() {
        return addition_root;
    }

    let exploded_base = explode(std::slice::from_ref(base));
    let existing = collect_sublayer_names(base);
    let existing: Vec<&str> = existing.iter().map(String::as_str).collect();
    let mut exploded: Vec<_> = explode(std::slice::from_ref(&addition_root))
        .into_iter()
        .filter(|entry| !existing.contains(&entry.leaf().name.as_str()))
        .collect();
    debug!(
        novel = exploded.len(),
        existing = exploded_base.len(),
        "merging capability subtree"
    );
    exploded.extend(exploded_base);
    implode(exploded, swipe_active)
        .into_iter()
        .next()
        .expect("merge of a non-empty base yields one tree")
}
