//! WMS request parameter computation
//!
//! Derives `LAYERS`/`OPACITIES`/`MAP` request parameters and the
//! queryable-layer list from a layer's visible leaves. The values are
//! consumed by an external request builder; no requests are issued here.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::domain::entities::{Layer, LayerKind, WmsRequestParams};

/// Depth-first collection of leaf names and opacities below `sublayer`.
///
/// Invisible groups are skipped entirely and not recursed into, unless
/// `visibilities` is given: then recursion always happens and each leaf
/// additionally records its own visibility, preserving depth-first
/// order. Queryable leaf names are collected separately and never
/// reordered.
pub fn collect_wms_sublayer_params(
    sublayer: &Layer,
    layer_names: &mut Vec<String>,
    opacities: &mut Vec<u8>,
    queryable: &mut Vec<String>,
    mut visibilities: Option<&mut Vec<bool>>,
) {
    if !sublayer.visibility && visibilities.is_none() {
        return;
    }
    if sublayer.has_sublayers() {
        for child in sublayer.sublayers.iter().flatten() {
            collect_wms_sublayer_params(
                child,
                layer_names,
                opacities,
                queryable,
                visibilities.as_deref_mut(),
            );
        }
    } else {
        layer_names.push(sublayer.name.clone());
        opacities.push(sublayer.opacity);
        if sublayer.queryable {
            queryable.push(sublayer.name.clone());
        }
        if let Some(visibilities) = visibilities {
            visibilities.push(sublayer.visibility);
        }
    }
}

/// Build the request parameters for a WMS layer.
///
/// Leaf order is reversed relative to the tree (WMS draws bottom-up),
/// then the optional `drawing_order` override reorders the name/opacity
/// pairs, dropping names it does not mention.
pub fn build_wms_params(layer: &Layer) -> WmsRequestParams {
    let map = wms_map_param(layer);
    let mut params = BTreeMap::new();
    if let Some(map) = map {
        params.insert("MAP".to_string(), map);
    }

    let Some(sublayers) = layer.sublayers.as_deref() else {
        params.insert("LAYERS".to_string(), layer.name.clone());
        let query_layers = if layer.queryable {
            vec![layer.name.clone()]
        } else {
            Vec::new()
        };
        return WmsRequestParams {
            params,
            query_layers,
        };
    };

    let mut layer_names = Vec::new();
    let mut opacities = Vec::new();
    let mut query_layers = Vec::new();
    for sublayer in sublayers {
        collect_wms_sublayer_params(
            sublayer,
            &mut layer_names,
            &mut opacities,
            &mut query_layers,
            None,
        );
    }
    layer_names.reverse();
    opacities.reverse();

    if let Some(order) = layer.drawing_order.as_deref().filter(|o| !o.is_empty()) {
        let indices: Vec<usize> = order
            .iter()
            .filter_map(|name| layer_names.iter().position(|n| n == name))
            .collect();
        layer_names = indices.iter().map(|&i| layer_names[i].clone()).collect();
        opacities = indices.iter().map(|&i| opacities[i]).collect();
    }

    params.insert("LAYERS".to_string(), layer_names.iter().join(","));
    params.insert(
        "OPACITIES".to_string(),
        opacities.iter().map(u8::to_string).join(","),
    );
    WmsRequestParams {
        params,
        query_layers,
    }
}

/// Extract the `map=` query parameter from the service url, for QGIS
/// Server setups without a rewrite rule.
fn wms_map_param(layer: &Layer) -> Option<String> {
    let LayerKind::Wms { url } = &layer.kind else {
        return None;
    };
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "map" || key == "MAP").then(|| value.to_string())
    })
}
