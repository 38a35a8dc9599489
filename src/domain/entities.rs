//! Domain entities: layer tree nodes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a top-level layer in the flat forest.
///
/// The flat array is kept front-to-back in descending role order
/// (markers first, backgrounds last). Background layers never take part
/// in explode/implode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LayerRole {
    Background,
    Theme,
    #[default]
    UserLayer,
    Selection,
    Marker,
}

/// Kind of a layer node, one variant per source type.
///
/// Group containers inside a theme tree carry `Group`; only WMS/WFS
/// sources carry a service url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Wms { url: String },
    Wfs { url: String },
    Vector,
    Separator,
    Placeholder,
    Group,
}

impl LayerKind {
    pub fn is_wms(&self) -> bool {
        matches!(self, LayerKind::Wms { .. })
    }
}

/// Request parameters computed for a WMS layer from its visible leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsRequestParams {
    /// `LAYERS`, `OPACITIES` and (if present in the service url) `MAP`
    pub params: BTreeMap<String, String>,
    /// Names of queryable leaves, for GetFeatureInfo requests
    pub query_layers: Vec<String>,
}

/// A node in the layer forest.
///
/// `id` is shared by all fragments produced by exploding one multi-level
/// node; `uuid` is instance-unique across the whole forest and is
/// regenerated whenever a node is duplicated into a new position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub role: LayerRole,
    #[serde(flatten)]
    pub kind: LayerKind,
    #[serde(default = "default_true")]
    pub visibility: bool,
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    #[serde(default, skip_serializing_if = "is_false")]
    pub mutually_exclusive: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub queryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sublayers: Option<Vec<Layer>>,
    /// Explicit leaf-name drawing order override, theme root only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing_order: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<WmsRequestParams>,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> u8 {
    255
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl Layer {
    /// Create a leaf layer with defaults (visible, fully opaque, user role).
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            uuid: Uuid::new_v4(),
            name: name.into(),
            title: None,
            role: LayerRole::default(),
            kind,
            visibility: true,
            opacity: 255,
            mutually_exclusive: false,
            queryable: false,
            sublayers: None,
            drawing_order: None,
            params: None,
        }
    }

    /// Create a group container with the given children.
    pub fn group(id: impl Into<String>, name: impl Into<String>, sublayers: Vec<Layer>) -> Self {
        let mut layer = Self::new(id, name, LayerKind::Group);
        layer.sublayers = Some(sublayers);
        layer
    }

    /// Clone every attribute except the subtree.
    pub fn shell(&self) -> Self {
        Self {
            id: self.id.clone(),
            uuid: self.uuid,
            name: self.name.clone(),
            title: self.title.clone(),
            role: self.role,
            kind: self.kind.clone(),
            visibility: self.visibility,
            opacity: self.opacity,
            mutually_exclusive: self.mutually_exclusive,
            queryable: self.queryable,
            sublayers: None,
            drawing_order: self.drawing_order.clone(),
            params: self.params.clone(),
        }
    }

    /// True if the node has a non-empty sublayer list.
    pub fn has_sublayers(&self) -> bool {
        self.sublayers.as_ref().is_some_and(|subs| !subs.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering_matches_front_to_back_convention() {
        assert!(LayerRole::Background < LayerRole::Theme);
        assert!(LayerRole::Theme < LayerRole::UserLayer);
        assert!(LayerRole::UserLayer < LayerRole::Selection);
        assert!(LayerRole::Selection < LayerRole::Marker);
    }

    #[test]
    fn test_layer_json_roundtrip() {
        let layer = Layer::group(
            "t",
            "root",
            vec![Layer::new("a", "a", LayerKind::Group)],
        );
        let json = serde_json::to_string(&layer).unwrap();
        assert!(json.contains("\"type\":\"group\""));
        let back: Layer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layer);
    }

    #[test]
    fn test_layer_json_defaults() {
        let json = r#"{"id":"x","name":"x","type":"vector"}"#;
        let layer: Layer = serde_json::from_str(json).unwrap();
        assert!(layer.visibility);
        assert_eq!(layer.opacity, 255);
        assert_eq!(layer.role, LayerRole::UserLayer);
        assert!(!layer.mutually_exclusive);
    }
}
