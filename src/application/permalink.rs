//! Compact URL parameter codec for the flattened layer order
//!
//! Encodes the non-background layer sequence into the `l` query parameter
//! (`name[transparency]!` entries, `wms:`/`wfs:` external sources,
//! `sep:` separators) and the visible background into `bl`, decodes such
//! parameters back into layer configs, and restores a theme tree from
//! decoded configs.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::application::services::explode::{explode, implode};
use crate::application::services::wms::collect_wms_sublayer_params;
use crate::domain::entities::{Layer, LayerKind, LayerRole};

/// Source kind of a decoded permalink entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerConfigKind {
    Theme,
    Wms,
    Wfs,
    Separator,
}

/// One decoded entry of the `l` parameter: enough to re-attach or
/// re-fetch the layer it stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub id: String,
    pub kind: LayerConfigKind,
    pub url: Option<String>,
    pub name: String,
    pub opacity: u8,
    pub visibility: bool,
}

/// External layers referenced by restored placeholders, keyed by
/// `"<kind>:<url>"`. The capabilities-fetch collaborator resolves each
/// entry and swaps the placeholder out via `replace_placeholder`.
pub type ExternalLayerRegistry = HashMap<String, Vec<ExternalLayerRef>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLayerRef {
    pub id: String,
    pub name: String,
    pub opacity: u8,
    pub visibility: bool,
}

fn transparency_suffix(opacity: u8, visibility: bool) -> String {
    let mut suffix = String::new();
    if opacity < 255 {
        let transparency = 100 - (f64::from(opacity) / 255.0 * 100.0).round() as u8;
        suffix.push_str(&format!("[{transparency}]"));
    }
    if !visibility {
        suffix.push('!');
    }
    suffix
}

/// Encode the non-background layer sequence as the `l` parameter.
///
/// Theme roots contribute one entry per leaf (visible or not), external
/// user layers contribute a `kind:url#name` entry, separators a
/// `sep:title` entry. With `reverse` the whole sequence is emitted in
/// display order instead of tree order.
pub fn encode_layer_param(layers: &[Layer], reverse: bool) -> String {
    let mut names = Vec::new();
    let mut opacities = Vec::new();
    let mut visibilities = Vec::new();
    for layer in layers {
        match (layer.role, &layer.kind) {
            (LayerRole::Theme, _) => {
                let mut queryable = Vec::new();
                collect_wms_sublayer_params(
                    layer,
                    &mut names,
                    &mut opacities,
                    &mut queryable,
                    Some(&mut visibilities),
                );
            }
            (LayerRole::UserLayer, LayerKind::Wms { url }) => {
                names.push(format!("wms:{url}#{}", layer.name));
                opacities.push(layer.opacity);
                visibilities.push(layer.visibility);
            }
            (LayerRole::UserLayer, LayerKind::Wfs { url }) => {
                names.push(format!("wfs:{url}#{}", layer.name));
                opacities.push(layer.opacity);
                visibilities.push(layer.visibility);
            }
            (LayerRole::UserLayer, LayerKind::Separator) => {
                names.push(format!("sep:{}", layer.title.as_deref().unwrap_or("")));
                opacities.push(255);
                visibilities.push(true);
            }
            _ => {}
        }
    }
    let mut entries: Vec<String> = names
        .iter()
        .zip(opacities.iter().zip(&visibilities))
        .map(|(name, (&opacity, &visibility))| {
            format!("{name}{}", transparency_suffix(opacity, visibility))
        })
        .collect();
    if reverse {
        entries.reverse();
    }
    entries.join(",")
}

/// The `bl` parameter: name of the visible background layer, if any.
pub fn background_layer_param(layers: &[Layer]) -> Option<String> {
    layers
        .iter()
        .find(|layer| layer.role == LayerRole::Background && layer.visibility)
        .map(|layer| layer.name.clone())
}

/// Decode a single `l` parameter entry.
pub fn decode_layer_param_entry(entry: &str) -> LayerConfig {
    static NAME_OPACITY: OnceLock<Regex> = OnceLock::new();
    let name_opacity = NAME_OPACITY
        .get_or_init(|| Regex::new(r"^([^\[]+)\[(\d+)\]$").expect("pattern compiles"));

    let mut visibility = true;
    let mut rest = entry;
    if let Some(stripped) = rest.strip_suffix('!') {
        visibility = false;
        rest = stripped;
    }
    let mut name = rest.to_string();
    let mut opacity = 255;
    if let Some(captures) = name_opacity.captures(rest) {
        name = captures[1].to_string();
        let transparency: f64 = captures[2].parse().unwrap_or(0.0);
        opacity = (255.0 - transparency / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    let mut kind = LayerConfigKind::Theme;
    let mut url = None;
    if let Some(stripped) = name.strip_prefix("wms:").or_else(|| name.strip_prefix("wfs:")) {
        kind = if name.starts_with("wms:") {
            LayerConfigKind::Wms
        } else {
            LayerConfigKind::Wfs
        };
        match stripped.rfind('#') {
            Some(pos) => {
                url = Some(stripped[..pos].to_string());
                name = stripped[pos + 1..].to_string();
            }
            None => {
                url = Some(stripped.to_string());
                name = String::new();
            }
        }
    } else if let Some(stripped) = name.strip_prefix("sep:") {
        kind = LayerConfigKind::Separator;
        name = stripped.to_string();
    }

    LayerConfig {
        id: Uuid::new_v4().to_string(),
        kind,
        url,
        name,
        opacity,
        visibility,
    }
}

/// Decode a full `l` parameter into its entries.
pub fn decode_layer_param(param: &str) -> Vec<LayerConfig> {
    param
        .split(',')
        .filter(|entry| !entry.is_empty())
        .map(decode_layer_param_entry)
        .collect()
}

/// A fresh separator user layer.
pub fn separator_layer(title: &str) -> Layer {
    let mut layer = Layer::new(
        Uuid::new_v4().to_string(),
        String::new(),
        LayerKind::Separator,
    );
    layer.title = Some(title.to_string());
    layer.role = LayerRole::UserLayer;
    layer
}

/// A placeholder user layer standing in for an external source that is
/// not resolved yet. The reference is recorded in `external` so the
/// resolver knows what to fetch for each placeholder id.
pub fn placeholder_layer(config: &LayerConfig, external: &mut ExternalLayerRegistry) -> Layer {
    let prefix = match config.kind {
        LayerConfigKind::Wfs => "wfs",
        _ => "wms",
    };
    let key = format!("{prefix}:{}", config.url.as_deref().unwrap_or(""));
    external.entry(key).or_default().push(ExternalLayerRef {
        id: config.id.clone(),
        name: config.name.clone(),
        opacity: config.opacity,
        visibility: config.visibility,
    });
    let mut layer = Layer::new(
        config.id.clone(),
        config.name.clone(),
        LayerKind::Placeholder,
    );
    layer.title = Some(config.name.clone());
    layer.role = LayerRole::UserLayer;
    layer
}

/// Restore leaf visibility and opacity of a theme tree from decoded
/// configs, keeping tree order. Leaves without a matching config are
/// hidden; external configs become placeholders in front of the theme;
/// separators are not restored.
pub fn restore_layer_params(
    theme_layer: &Layer,
    layer_configs: &[LayerConfig],
    external: &mut ExternalLayerRegistry,
) -> Vec<Layer> {
    let mut exploded = explode(std::slice::from_ref(theme_layer));
    for entry in &mut exploded {
        let leaf_name = entry.leaf().name.clone();
        let config = layer_configs
            .iter()
            .find(|config| config.kind == LayerConfigKind::Theme && config.name == leaf_name);
        let leaf = entry.leaf_mut();
        match config {
            Some(config) => {
                leaf.opacity = config.opacity;
                leaf.visibility = config.visibility;
            }
            None => leaf.visibility = false,
        }
    }

    let mut restored = Vec::new();
    for config in layer_configs {
        match config.kind {
            LayerConfigKind::Theme | LayerConfigKind::Separator => {}
            LayerConfigKind::Wms | LayerConfigKind::Wfs => {
                restored.extend(explode(&[placeholder_layer(config, external)]));
            }
        }
    }
    restored.extend(exploded);
    debug!(entries = restored.len(), "restored layer params");
    implode(restored, false)
}

/// Restore a theme tree from decoded configs including their order:
/// leaves are emitted in config order, unmentioned leaves are dropped,
/// separators and external placeholders are recreated in place.
pub fn restore_ordered_layer_params(
    theme_layer: &Layer,
    layer_configs: &[LayerConfig],
    external: &mut ExternalLayerRegistry,
) -> Vec<Layer> {
    let exploded = explode(std::slice::from_ref(theme_layer));
    let mut reordered = Vec::new();
    for config in layer_configs {
        match config.kind {
            LayerConfigKind::Theme => {
                if let Some(entry) = exploded.iter().find(|e| e.leaf().name == config.name) {
                    let mut entry = entry.clone();
                    let leaf = entry.leaf_mut();
                    leaf.opacity = config.opacity;
                    leaf.visibility = config.visibility;
                    reordered.push(entry);
                }
            }
            LayerConfigKind::Separator => {
                reordered.extend(explode(&[separator_layer(&config.name)]));
            }
            LayerConfigKind::Wms | LayerConfigKind::Wfs => {
                reordered.extend(explode(&[placeholder_layer(config, external)]));
            }
        }
    }
    debug!(entries = reordered.len(), "restored ordered layer params");
    implode(reordered, false)
}

/// Map every group name in `layer` to the leaf names below it.
pub fn collect_group_layers(
    layer: &Layer,
    parent_groups: &[&str],
    group_layers: &mut HashMap<String, Vec<String>>,
) {
    if layer.has_sublayers() {
        let mut groups = parent_groups.to_vec();
        groups.push(&layer.name);
        for sublayer in layer.sublayers.iter().flatten() {
            collect_group_layers(sublayer, &groups, group_layers);
        }
    } else {
        for group in parent_groups {
            group_layers
                .entry((*group).to_string())
                .or_default()
                .push(layer.name.clone());
        }
    }
}

/// Expand configs naming a group of `layer` into one config per leaf of
/// that group; configs naming no group pass through unchanged.
pub fn replace_layer_groups(layer_configs: &[LayerConfig], layer: &Layer) -> Vec<LayerConfig> {
    let mut group_layers = HashMap::new();
    collect_group_layers(layer, &[], &mut group_layers);
    let mut expanded = Vec::new();
    for config in layer_configs {
        match group_layers.get(&config.name) {
            Some(names) => expanded.extend(names.iter().map(|name| LayerConfig {
                name: name.clone(),
                ..config.clone()
            })),
            None => expanded.push(config.clone()),
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_group_tree_when_collecting_group_layers_then_leafs_map_to_all_ancestors() {
        let tree = Layer::group(
            "t".to_string(),
            "root".to_string(),
            vec![Layer::group(
                "t".to_string(),
                "inner".to_string(),
                vec![Layer::new("t".to_string(), "a".to_string(), LayerKind::Group)],
            )],
        );
        let mut groups = HashMap::new();
        collect_group_layers(&tree, &[], &mut groups);
        assert_eq!(groups["root"], vec!["a".to_string()]);
        assert_eq!(groups["inner"], vec!["a".to_string()]);
    }
}
