//! The caller-held flat layer array and the operations that drive it
//!
//! `LayerStack` owns the externally observable state: the flat array of
//! root layers in role order plus the swipe setting. Every operation is
//! pure and returns a new stack; policy rejections (stale references,
//! forbidden mutex hides) return an unchanged clone.

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::error::ApplicationResult;
use crate::application::services::merge::merge_sublayers;
use crate::application::services::reorder;
use crate::application::services::wms::build_wms_params;
use crate::domain::entities::{Layer, LayerKind, LayerRole};
use crate::domain::path::{sublayer_at, sublayer_at_mut};
use crate::domain::tree::{assign_uuids, validate_forest};

/// A property change applied to a single node (and optionally
/// propagated).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerPropertyChange {
    Visibility(bool),
    Opacity(u8),
}

impl LayerPropertyChange {
    fn apply(self, layer: &mut Layer) {
        match self {
            LayerPropertyChange::Visibility(value) => layer.visibility = value,
            LayerPropertyChange::Opacity(value) => layer.opacity = value,
        }
    }

    fn is_visibility(self) -> bool {
        matches!(self, LayerPropertyChange::Visibility(_))
    }
}

/// Which way a property change spreads from the addressed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecurseDirection {
    #[default]
    None,
    Children,
    Parents,
    Both,
}

impl RecurseDirection {
    fn children(self) -> bool {
        matches!(self, RecurseDirection::Children | RecurseDirection::Both)
    }

    fn parents(self) -> bool {
        matches!(self, RecurseDirection::Parents | RecurseDirection::Both)
    }
}

/// The flat array of root layers plus the swipe setting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStack {
    pub flat: Vec<Layer>,
    pub swipe: Option<f64>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn swipe_active(&self) -> bool {
        self.swipe.is_some()
    }

    /// Replace the whole flat array, resetting swipe.
    pub fn set_layers(&self, layers: Vec<Layer>) -> Self {
        Self {
            flat: layers,
            swipe: None,
        }
    }

    pub fn remove_all_layers(&self) -> Self {
        Self {
            flat: Vec::new(),
            swipe: None,
        }
    }

    /// Change a property of the node addressed by root `uuid` and
    /// `sublayer_path`, optionally propagating it up and/or down.
    ///
    /// Explicitly hiding a member of a mutually exclusive group is
    /// rejected (toggle another member instead), and visibility never
    /// propagates into a mutually exclusive group's children. Making a
    /// background layer visible hides every other background layer.
    #[instrument(level = "debug", skip(self))]
    pub fn change_layer_property(
        &self,
        uuid: Uuid,
        sublayer_path: &[usize],
        change: LayerPropertyChange,
        recurse: RecurseDirection,
    ) -> Self {
        let Some(target) = self.flat.iter().find(|layer| layer.uuid == uuid) else {
            return self.clone();
        };
        let background_visibility_changed =
            target.role == LayerRole::Background && change.is_visibility();

        let parent_path = &sublayer_path[..sublayer_path.len().saturating_sub(1)];
        let mutex_visibility_changed = !sublayer_path.is_empty()
            && change.is_visibility()
            && sublayer_at(target, parent_path).is_some_and(|parent| parent.mutually_exclusive);
        if mutex_visibility_changed && change == LayerPropertyChange::Visibility(false) {
            debug!("rejecting explicit hide inside mutually exclusive group");
            return self.clone();
        }

        let flat = self
            .flat
            .iter()
            .map(|layer| {
                if layer.uuid == uuid {
                    let mut newlayer = layer.clone();
                    let Some(newsublayer) = sublayer_at_mut(&mut newlayer, sublayer_path) else {
                        return layer.clone();
                    };
                    change.apply(newsublayer);
                    if recurse.children() {
                        propagate_property(newsublayer, change, None);
                    }

                    if mutex_visibility_changed {
                        let target_idx = sublayer_path[sublayer_path.len() - 1];
                        let parent = sublayer_at_mut(&mut newlayer, parent_path)
                            .expect("parent path was just walked");
                        for (idx, sibling) in
                            parent.sublayers.iter_mut().flatten().enumerate()
                        {
                            sibling.visibility = idx == target_idx;
                        }
                    }

                    if recurse.parents() {
                        propagate_property(&mut newlayer, change, Some(sublayer_path));
                    }
                    if newlayer.kind.is_wms() {
                        newlayer.params = Some(build_wms_params(&newlayer));
                    }
                    newlayer
                } else if layer.role == LayerRole::Background && background_visibility_changed {
                    let mut newlayer = layer.clone();
                    newlayer.visibility = false;
                    newlayer
                } else {
                    layer.clone()
                }
            })
            .collect();
        Self { flat, swipe: self.swipe }
    }

    /// Insert a new layer into the flat array.
    ///
    /// With `before_name` the layer lands in front of the leaf of that
    /// name; with `pos` at that slot; otherwise in role order (markers
    /// in front, backgrounds at the back).
    pub fn add_layer(&self, layer: Layer, pos: Option<usize>, before_name: Option<&str>) -> Self {
        let mut newlayer = layer;
        if newlayer.id.is_empty() {
            newlayer.id = Uuid::new_v4().to_string();
        }
        if newlayer.name.is_empty() {
            newlayer.name = newlayer.id.clone();
        }
        assign_uuids(&mut newlayer, &mut Default::default());
        if newlayer.kind.is_wms() {
            newlayer.params = Some(build_wms_params(&newlayer));
        }

        let flat = if let Some(before_name) = before_name {
            reorder::insert_layer(&self.flat, &newlayer, before_name)
        } else {
            let mut flat = self.flat.clone();
            let inspos = match pos {
                Some(pos) => pos.min(flat.len()),
                None => flat
                    .iter()
                    .position(|existing| newlayer.role >= existing.role)
                    .unwrap_or(flat.len()),
            };
            flat.insert(inspos, newlayer);
            flat
        };
        Self { flat, swipe: self.swipe }
    }

    /// Insert a separator in front of the addressed node.
    pub fn add_separator(
        &self,
        title: &str,
        before_layer_id: &str,
        before_path: &[usize],
    ) -> Self {
        let flat = reorder::insert_separator(
            &self.flat,
            title,
            before_layer_id,
            before_path,
            self.swipe_active(),
        );
        Self { flat, swipe: self.swipe }
    }

    /// Remove a layer or sublayer. Background layers and whole roots are
    /// filtered out directly; nested removals go through the
    /// explode/implode machinery (preserving an emptied theme root).
    pub fn remove_layer(&self, id: &str, sublayer_path: &[usize]) -> Self {
        let Some(layer) = self.flat.iter().find(|layer| layer.id == id) else {
            return self.clone();
        };
        let flat = if layer.role == LayerRole::Background || sublayer_path.is_empty() {
            self.flat
                .iter()
                .filter(|layer| layer.id != id)
                .cloned()
                .collect()
        } else {
            reorder::remove_layer(&self.flat, layer.uuid, sublayer_path, self.swipe_active())
        };
        Self { flat, swipe: self.swipe }
    }

    /// Move the addressed node by `delta` slots in the exploded order.
    pub fn reorder_layer(
        &self,
        uuid: Uuid,
        sublayer_path: &[usize],
        delta: isize,
        prevent_group_split: bool,
    ) -> Self {
        let flat = reorder::reorder_layers(
            &self.flat,
            uuid,
            sublayer_path,
            delta,
            self.swipe_active(),
            prevent_group_split,
        );
        Self { flat, swipe: self.swipe }
    }

    /// Merge a freshly loaded subtree into the theme layer.
    pub fn add_theme_sublayers(&self, addition: &Layer) -> Self {
        let Some(idx) = self
            .flat
            .iter()
            .position(|layer| layer.role == LayerRole::Theme)
        else {
            return self.clone();
        };
        let mut flat = self.flat.clone();
        let mut merged = merge_sublayers(&flat[idx], addition, self.swipe_active());
        merged.visibility = true;
        if merged.kind.is_wms() {
            merged.params = Some(build_wms_params(&merged));
        }
        flat[idx] = merged;
        Self { flat, swipe: self.swipe }
    }

    /// Swap a placeholder for its resolved layer, or drop it when the
    /// resolution failed (`None`).
    pub fn replace_placeholder(&self, id: &str, layer: Option<Layer>) -> Self {
        let flat = match layer {
            Some(resolved) => self
                .flat
                .iter()
                .map(|layer| {
                    if layer.kind == LayerKind::Placeholder && layer.id == id {
                        let mut newlayer = resolved.clone();
                        assign_uuids(&mut newlayer, &mut Default::default());
                        if newlayer.kind.is_wms() {
                            newlayer.params = Some(build_wms_params(&newlayer));
                        }
                        newlayer
                    } else {
                        layer.clone()
                    }
                })
                .collect(),
            None => self
                .flat
                .iter()
                .filter(|layer| !(layer.kind == LayerKind::Placeholder && layer.id == id))
                .cloned()
                .collect(),
        };
        Self { flat, swipe: self.swipe }
    }

    /// Set or clear the swipe position. Toggling between set and unset
    /// re-implodes the forest so the first entry is isolated (or merged
    /// back).
    pub fn set_swipe(&self, swipe: Option<f64>) -> Self {
        let flat = if self.swipe.is_some() != swipe.is_some() {
            reorder::reimplode(&self.flat, swipe.is_some())
        } else {
            self.flat.clone()
        };
        Self { flat, swipe }
    }

    /// Load a flat forest from its JSON form, validating structural
    /// invariants.
    pub fn from_json(json: &str) -> ApplicationResult<Self> {
        let flat: Vec<Layer> = serde_json::from_str(json)?;
        validate_forest(&flat)?;
        Ok(Self { flat, swipe: None })
    }

    pub fn to_json(&self) -> ApplicationResult<String> {
        Ok(serde_json::to_string_pretty(&self.flat)?)
    }
}

/// Spread a property change downward, either into every descendant
/// (`path` is `None`) or along one ancestor chain. Visibility never
/// spreads into a mutually exclusive group's children.
fn propagate_property(layer: &mut Layer, change: LayerPropertyChange, path: Option<&[usize]>) {
    change.apply(layer);
    if change.is_visibility() && layer.mutually_exclusive {
        return;
    }
    match path {
        None => {
            for sublayer in layer.sublayers.iter_mut().flatten() {
                propagate_property(sublayer, change, None);
            }
        }
        Some(path) => {
            let Some((&next, rest)) = path.split_first() else {
                return;
            };
            if let Some(sublayer) = layer
                .sublayers
                .as_deref_mut()
                .and_then(|sublayers| sublayers.get_mut(next))
            {
                propagate_property(sublayer, change, Some(rest));
            }
        }
    }
}
