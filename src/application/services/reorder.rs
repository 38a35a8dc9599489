//! Structural edits on the flat forest: reorder, insert, remove
//!
//! Every operation extracts the non-background roots, explodes them,
//! transforms the flat sequence, re-implodes and re-attaches the
//! background roots unchanged. Stale references and boundary violations
//! are policy rejections: the input is returned unchanged.

use tracing::debug;
use uuid::Uuid;

use crate::application::permalink::separator_layer;
use crate::application::services::explode::{explode, implode, ExplodedLayer};
use crate::application::services::wms::build_wms_params;
use crate::domain::entities::{Layer, LayerRole};
use crate::domain::path::path_equal_or_below;

fn split_foreground(layers: &[Layer]) -> (Vec<Layer>, Vec<Layer>) {
    let (background, foreground) = layers
        .iter()
        .cloned()
        .partition(|layer| layer.role == LayerRole::Background);
    (foreground, background)
}

/// Explode and re-implode the forest without moving anything, used when
/// swipe mode is toggled and the first-entry isolation must be applied
/// or undone.
pub fn reimplode(layers: &[Layer], swipe_active: bool) -> Vec<Layer> {
    let (foreground, background) = split_foreground(layers);
    let mut layers = implode(explode(&foreground), swipe_active);
    layers.extend(background);
    layers
}

/// Move the exploded entries addressed by root `uuid` and `sublayer_path`
/// by `delta` slots.
///
/// A path addressing a group moves all of its leaves. With
/// `prevent_group_split`, an entry never leaves its containing parent
/// group, and a move that would land inside a different sibling subtree
/// is widened so the whole neighboring group is hopped over atomically.
pub fn reorder_layers(
    layers: &[Layer],
    uuid: Uuid,
    sublayer_path: &[usize],
    delta: isize,
    swipe_active: bool,
    prevent_group_split: bool,
) -> Vec<Layer> {
    let (foreground, background) = split_foreground(layers);
    let mut exploded = explode(&foreground);

    let indices: Vec<usize> = exploded
        .iter()
        .enumerate()
        .filter(|(_, entry)| {
            entry.layer.uuid == uuid && path_equal_or_below(sublayer_path, &entry.path)
        })
        .map(|(idx, _)| idx)
        .collect();
    let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
        // Stale reference: the addressed node is gone
        return layers.to_vec();
    };
    if delta == 0
        || first as isize + delta < 0
        || last as isize + delta >= exploded.len() as isize
    {
        return layers.to_vec();
    }

    let mut effective = delta;
    if prevent_group_split {
        let idx = if delta < 0 { first } else { last };
        let neighbor_idx = (idx as isize + delta) as usize;

        // Never move an entry out of a containing group below root level
        if sublayer_path.len() >= 2 {
            let parent = &sublayer_path[..sublayer_path.len() - 1];
            let neighbor = &exploded[neighbor_idx];
            if neighbor.layer.id != exploded[idx].layer.id
                || !path_equal_or_below(parent, &neighbor.path)
            {
                return layers.to_vec();
            }
        }

        if straddles_sibling_group(&exploded, idx, neighbor_idx, sublayer_path) {
            let level = sublayer_path.len();
            let (block_start, block_end) = sibling_block(&exploded, neighbor_idx, level);
            effective = if delta > 0 {
                block_end as isize - last as isize
            } else {
                block_start as isize - first as isize
            };
            debug!(delta, effective, "widened move to keep sibling group whole");
        }
    }

    if effective < 0 {
        for &idx in &indices {
            let entry = exploded.remove(idx);
            exploded.insert((idx as isize + effective) as usize, entry);
        }
    } else {
        for &idx in indices.iter().rev() {
            let entry = exploded.remove(idx);
            exploded.insert((idx as isize + effective) as usize, entry);
        }
    }

    let mut layers = implode(exploded, swipe_active);
    layers.extend(background);
    layers
}

/// True if the naive one-slot move would interleave the moved entries
/// with a group they are not a sibling of.
fn straddles_sibling_group(
    exploded: &[ExplodedLayer],
    idx: usize,
    neighbor_idx: usize,
    sublayer_path: &[usize],
) -> bool {
    let neighbor = &exploded[neighbor_idx];
    if neighbor.layer.id != exploded[idx].layer.id {
        return true;
    }
    let own_parent = &sublayer_path[..sublayer_path.len().saturating_sub(1)];
    let neighbor_parent = &neighbor.path[..neighbor.path.len().saturating_sub(1)];
    neighbor_parent != own_parent
}

/// The contiguous run of entries around `idx` belonging to the same
/// sibling subtree at nesting depth `level`.
fn sibling_block(exploded: &[ExplodedLayer], idx: usize, level: usize) -> (usize, usize) {
    let anchor = &exploded[idx];
    let prefix_len = level.min(anchor.path.len());
    let same_block = |entry: &ExplodedLayer| {
        entry.layer.id == anchor.layer.id
            && entry.path.len() >= prefix_len
            && entry.path[..prefix_len] == anchor.path[..prefix_len]
    };
    let start = (0..idx)
        .rev()
        .take_while(|&i| same_block(&exploded[i]))
        .last()
        .unwrap_or(idx);
    let end = (idx + 1..exploded.len())
        .take_while(|&i| same_block(&exploded[i]))
        .last()
        .unwrap_or(idx);
    (start, end)
}

/// Insert a new layer so that its first leaf lands directly before the
/// leaf called `before_name`. Without a match the forest is only
/// re-imploded.
pub fn insert_layer(layers: &[Layer], new_layer: &Layer, before_name: &str) -> Vec<Layer> {
    let (foreground, background) = split_foreground(layers);
    let mut exploded = explode(&foreground);
    let added = explode(std::slice::from_ref(new_layer));
    if let Some(pos) = exploded
        .iter()
        .position(|entry| entry.leaf().name == before_name)
    {
        exploded.splice(pos..pos, added);
    }
    let mut layers = implode(exploded, false);
    layers.extend(background);
    layers
}

/// Insert a separator entry directly before the node addressed by
/// `before_layer_id` and `before_path`.
pub fn insert_separator(
    layers: &[Layer],
    title: &str,
    before_layer_id: &str,
    before_path: &[usize],
    swipe_active: bool,
) -> Vec<Layer> {
    let (foreground, background) = split_foreground(layers);
    let mut exploded = explode(&foreground);
    if let Some(pos) = exploded
        .iter()
        .position(|entry| entry.layer.id == before_layer_id && entry.path == before_path)
    {
        let separator = explode(&[separator_layer(title)]);
        exploded.splice(pos..pos, separator);
    }
    let mut layers = implode(exploded, swipe_active);
    layers.extend(background);
    layers
}

/// Remove the node addressed by root `uuid` and `sublayer_path`,
/// including every leaf below it. The theme root survives even when its
/// last leaf is removed: it is re-added with an empty sublayer list.
pub fn remove_layer(
    layers: &[Layer],
    uuid: Uuid,
    sublayer_path: &[usize],
    swipe_active: bool,
) -> Vec<Layer> {
    let (foreground, background) = split_foreground(layers);
    let mut exploded = explode(&foreground);
    exploded.retain(|entry| {
        entry.layer.uuid != uuid || !path_equal_or_below(sublayer_path, &entry.path)
    });
    let mut newlayers = implode(exploded, swipe_active);

    if !newlayers.iter().any(|layer| layer.role == LayerRole::Theme) {
        if let Some(theme) = layers.iter().find(|layer| layer.role == LayerRole::Theme) {
            let mut theme = theme.shell();
            theme.sublayers = Some(Vec::new());
            theme.params = Some(build_wms_params(&theme));
            newlayers.push(theme);
        }
    }

    newlayers.extend(background);
    newlayers
}
