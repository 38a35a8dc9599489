//! Sublayer paths: index chains addressing a node inside a layer tree
//!
//! A path is only valid against the tree snapshot it was derived from;
//! paths are never persisted across a structural mutation.

use crate::domain::entities::Layer;

/// Ordered child indices from a root layer down to a target node.
pub type SublayerPath = Vec<usize>;

/// True if `child` addresses `parent` itself or a node below it.
pub fn path_equal_or_below(parent: &[usize], child: &[usize]) -> bool {
    child.len() >= parent.len() && child[..parent.len()] == *parent
}

/// Resolve a path against a layer, if the path stays within the tree.
pub fn sublayer_at<'a>(layer: &'a Layer, path: &[usize]) -> Option<&'a Layer> {
    let mut node = layer;
    for &idx in path {
        node = node.sublayers.as_ref()?.get(idx)?;
    }
    Some(node)
}

/// Mutable counterpart of [`sublayer_at`].
pub fn sublayer_at_mut<'a>(layer: &'a mut Layer, path: &[usize]) -> Option<&'a mut Layer> {
    let mut node = layer;
    for &idx in path {
        node = node.sublayers.as_mut()?.get_mut(idx)?;
    }
    Some(node)
}
