//! Mutually-exclusive group enforcement

use crate::domain::entities::Layer;

/// Ensure every group flagged mutually exclusive has exactly one visible
/// child: the first visible child wins, later visible siblings are
/// hidden, and if none is visible the first child is forced visible.
///
/// Recurses into every child so nested exclusive groups are each fixed
/// independently. A flagged group with zero children is tolerated.
pub fn ensure_mutually_exclusive(group: &mut Layer) {
    let exclusive = group.mutually_exclusive;
    if let Some(sublayers) = group.sublayers.as_mut() {
        let mut visible_seen = false;
        for sublayer in sublayers.iter_mut() {
            if !visible_seen && sublayer.visibility {
                visible_seen = true;
            } else if exclusive && visible_seen {
                sublayer.visibility = false;
            }
            ensure_mutually_exclusive(sublayer);
        }
        if exclusive && !visible_seen {
            if let Some(first) = sublayers.first_mut() {
                first.visibility = true;
            }
        }
    }
}
