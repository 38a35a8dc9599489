//! Explode/implode: the flat, path-addressed working form of a forest
//!
//! `explode` turns a forest into one entry per leaf; `implode` is the
//! inverse, merging adjacent entries that belong to the same root. The
//! exploded form is ephemeral: it exists only inside one transformation.

use std::collections::HashSet;

use tracing::debug;

use crate::application::services::mutex::ensure_mutually_exclusive;
use crate::application::services::wms::build_wms_params;
use crate::domain::entities::Layer;
use crate::domain::path::SublayerPath;
use crate::domain::tree::assign_uuids;

/// One leaf of an exploded forest: a single-child chain copy of its root
/// down to the leaf, plus the leaf's root-relative path.
///
/// Entries come from [`explode`]; `layer` must carry a single-child
/// chain at least `path.len()` levels deep. The chain accessors panic on
/// a hand-built entry that violates this.
#[derive(Debug, Clone)]
pub struct ExplodedLayer {
    pub layer: Layer,
    pub path: SublayerPath,
}

impl ExplodedLayer {
    /// The leaf at the end of the chain.
    pub fn leaf(&self) -> &Layer {
        let mut node = &self.layer;
        for _ in 0..self.path.len() {
            node = &node
                .sublayers
                .as_deref()
                .expect("exploded entry carries a single-child chain")[0];
        }
        node
    }

    /// Mutable access to the leaf at the end of the chain.
    pub fn leaf_mut(&mut self) -> &mut Layer {
        let mut node = &mut self.layer;
        for _ in 0..self.path.len() {
            node = &mut node
                .sublayers
                .as_deref_mut()
                .expect("exploded entry carries a single-child chain")[0];
        }
        node
    }
}

/// Flatten a forest into one entry per leaf, depth-first left-to-right.
///
/// A root without sublayers (including one with an explicitly empty
/// list) explodes to a single entry with an empty path, treating the
/// root as its own leaf. Empty groups below the root recurse into
/// nothing and are thereby pruned.
pub fn explode(layers: &[Layer]) -> Vec<ExplodedLayer> {
    let mut exploded = Vec::new();
    for layer in layers {
        if layer.has_sublayers() {
            explode_sublayers(layer, layer, &[], &mut exploded);
        } else {
            exploded.push(ExplodedLayer {
                layer: layer.clone(),
                path: Vec::new(),
            });
        }
    }
    exploded
}

fn explode_sublayers(
    root: &Layer,
    parent: &Layer,
    parent_path: &[usize],
    exploded: &mut Vec<ExplodedLayer>,
) {
    for (idx, sublayer) in parent.sublayers.iter().flatten().enumerate() {
        let mut path = parent_path.to_vec();
        path.push(idx);
        if sublayer.sublayers.is_some() {
            explode_sublayers(root, sublayer, &path, exploded);
        } else {
            exploded.push(ExplodedLayer {
                layer: single_chain(root, &path),
                path,
            });
        }
    }
}

/// Rebuild a copy of `root` reduced to the single-child chain leading to
/// the node at `path`. The copy is structurally independent of the
/// original tree.
fn single_chain(root: &Layer, path: &[usize]) -> Layer {
    match path.split_first() {
        None => root.clone(),
        Some((&idx, rest)) => {
            let child = &root
                .sublayers
                .as_deref()
                .expect("chain path stays within the tree")[idx];
            let mut copy = root.shell();
            copy.sublayers = Some(vec![single_chain(child, rest)]);
            copy
        }
    }
}

/// Rebuild a forest from an exploded sequence.
///
/// Adjacent entries sharing the same root `id` are merged back into one
/// tree by descending both sides while container names match; sequence
/// order dictates sibling and nesting order. Afterwards uuids are made
/// unique, every exclusive group is fixed up and WMS request parameters
/// are recomputed.
///
/// With `swipe_isolate_first`, the first entry is detached before the
/// merge and re-attached untouched, so swipe-compare mode keeps exactly
/// one layer excluded from grouping.
pub fn implode(mut exploded: Vec<ExplodedLayer>, swipe_isolate_first: bool) -> Vec<Layer> {
    debug!(
        entries = exploded.len(),
        swipe_isolate_first, "imploding exploded sequence"
    );
    let mut used = HashSet::new();

    let swipe_layer = if swipe_isolate_first && !exploded.is_empty() {
        let mut first = exploded.remove(0).layer;
        assign_uuids(&mut first, &mut used);
        Some(first)
    } else {
        None
    };

    let mut layers: Vec<Layer> = Vec::new();
    for entry in exploded {
        let source = entry.layer;
        let mergeable = layers
            .last()
            .is_some_and(|target| target.sublayers.is_some() && target.id == source.id)
            && source.has_sublayers();
        if mergeable {
            let target = layers.last_mut().expect("mergeable target exists");
            merge_chain(target, source, &mut used);
        } else {
            let mut layer = source;
            assign_uuids(&mut layer, &mut used);
            layers.push(layer);
        }
    }

    for layer in &mut layers {
        ensure_mutually_exclusive(layer);
    }
    for layer in &mut layers {
        if layer.kind.is_wms() {
            layer.params = Some(build_wms_params(layer));
        }
    }

    if let Some(swipe_layer) = swipe_layer {
        layers.insert(0, swipe_layer);
    }
    layers
}

/// Merge a single-child chain into the rightmost branch of `target`:
/// descend while both sides are groups with matching names, then append
/// the remaining chain as a new sibling.
fn merge_chain(target: &mut Layer, mut source: Layer, used: &mut HashSet<uuid::Uuid>) {
    let source_child = source
        .sublayers
        .take()
        .and_then(|mut chain| (!chain.is_empty()).then(|| chain.remove(0)))
        .expect("mergeable source carries a single-child chain");
    let sublayers = target
        .sublayers
        .as_mut()
        .expect("mergeable target is a group");
    let descend = sublayers.last().is_some_and(|last| {
        last.sublayers.is_some() && source_child.sublayers.is_some() && last.name == source_child.name
    });
    if descend {
        let last = sublayers.last_mut().expect("descend target exists");
        merge_chain(last, source_child, used);
    } else {
        let mut child = source_child;
        assign_uuids(&mut child, used);
        sublayers.push(child);
    }
}
