//! Pure tree helpers shared by the transformation services

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::entities::Layer;
use crate::domain::error::DomainError;
use crate::domain::path::SublayerPath;

/// Reassign `uuid`s so that every node in the subtree carries a value not
/// yet present in `used`. Existing uuids are kept when still free, so the
/// first occurrence of a node wins and duplicates get fresh ones.
pub fn assign_uuids(layer: &mut Layer, used: &mut HashSet<Uuid>) {
    if used.contains(&layer.uuid) {
        layer.uuid = Uuid::new_v4();
    }
    used.insert(layer.uuid);
    if let Some(sublayers) = layer.sublayers.as_mut() {
        for sublayer in sublayers {
            assign_uuids(sublayer, used);
        }
    }
}

/// Depth-first search below `layer` for the first node matching `pred`.
///
/// Mirrors the addressing rules of sublayer operations: a group is never
/// matched itself unless it is a leaf, and the returned path is relative
/// to `layer`.
pub fn search_sublayer<'a>(
    layer: &'a Layer,
    pred: &impl Fn(&Layer) -> bool,
) -> Option<(SublayerPath, &'a Layer)> {
    match layer.sublayers.as_deref() {
        Some(sublayers) => {
            for (idx, sublayer) in sublayers.iter().enumerate() {
                let found = if pred(sublayer) {
                    Some((Vec::new(), sublayer))
                } else {
                    search_sublayer(sublayer, pred)
                };
                if let Some((mut path, node)) = found {
                    path.insert(0, idx);
                    return Some((path, node));
                }
            }
            None
        }
        None if pred(layer) => Some((Vec::new(), layer)),
        None => None,
    }
}

/// Effective visibility of the node at `path`: the node and every
/// ancestor along the path must be visible.
pub fn sublayer_visible(layer: &Layer, path: &[usize]) -> bool {
    let mut node = layer;
    if !node.visibility {
        return false;
    }
    for &idx in path {
        match node.sublayers.as_deref().and_then(|subs| subs.get(idx)) {
            Some(sublayer) => node = sublayer,
            None => return false,
        }
        if !node.visibility {
            return false;
        }
    }
    true
}

/// All names in the subtree, root first, depth-first.
pub fn collect_sublayer_names(layer: &Layer) -> Vec<String> {
    let mut names = vec![layer.name.clone()];
    for sublayer in layer.sublayers.iter().flatten() {
        names.extend(collect_sublayer_names(sublayer));
    }
    names
}

/// Check the structural invariants of a flat forest: uuids unique across
/// the whole forest, names unique within every sibling set.
pub fn validate_forest(layers: &[Layer]) -> Result<(), DomainError> {
    let mut uuids = HashSet::new();
    for layer in layers {
        validate_node(layer, &mut uuids)?;
    }
    Ok(())
}

fn validate_node(layer: &Layer, uuids: &mut HashSet<Uuid>) -> Result<(), DomainError> {
    if !uuids.insert(layer.uuid) {
        return Err(DomainError::DuplicateUuid(layer.uuid));
    }
    if let Some(sublayers) = layer.sublayers.as_deref() {
        let mut names = HashSet::new();
        for sublayer in sublayers {
            if !names.insert(sublayer.name.as_str()) {
                return Err(DomainError::DuplicateSiblingName {
                    parent: layer.name.clone(),
                    name: sublayer.name.clone(),
                });
            }
            validate_node(sublayer, uuids)?;
        }
    }
    Ok(())
}
