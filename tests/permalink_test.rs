//! Tests for the permalink codec and restore operations

use std::collections::HashMap;

use rstest::rstest;

use maplayers::application::permalink::{
    background_layer_param, decode_layer_param, decode_layer_param_entry, encode_layer_param,
    replace_layer_groups, restore_layer_params, restore_ordered_layer_params, LayerConfig,
    LayerConfigKind,
};
use maplayers::application::services::explode;
use maplayers::domain::{Layer, LayerKind, LayerRole};

fn leaf(name: &str) -> Layer {
    Layer::new("t", name, LayerKind::Group)
}

fn theme_root(sublayers: Vec<Layer>) -> Layer {
    let mut root = Layer::group("t", "root", sublayers);
    root.role = LayerRole::Theme;
    root
}

fn theme_config(name: &str, opacity: u8, visibility: bool) -> LayerConfig {
    LayerConfig {
        id: "cfg".to_string(),
        kind: LayerConfigKind::Theme,
        url: None,
        name: name.to_string(),
        opacity,
        visibility,
    }
}

#[test]
fn given_theme_tree_when_encoding_then_entries_carry_transparency_and_visibility() {
    // Arrange
    let mut b = leaf("b");
    b.visibility = false;
    b.opacity = 128;
    let forest = vec![theme_root(vec![leaf("a"), b])];

    // Act
    let param = encode_layer_param(&forest, false);

    // Assert
    assert_eq!(param, "a,b[50]!");
}

#[test]
fn given_reverse_flag_when_encoding_then_sequence_is_reversed() {
    // Arrange
    let forest = vec![theme_root(vec![leaf("a"), leaf("b")])];

    // Act
    let param = encode_layer_param(&forest, true);

    // Assert
    assert_eq!(param, "b,a");
}

#[test]
fn given_external_and_separator_user_layers_when_encoding_then_prefixed_entries() {
    // Arrange
    let mut external = Layer::new(
        "e",
        "roads",
        LayerKind::Wms {
            url: "http://example.com/ows".to_string(),
        },
    );
    external.role = LayerRole::UserLayer;
    let mut separator = Layer::new("s", "", LayerKind::Separator);
    separator.role = LayerRole::UserLayer;
    separator.title = Some("My separator".to_string());
    let forest = vec![external, separator];

    // Act
    let param = encode_layer_param(&forest, false);

    // Assert
    assert_eq!(param, "wms:http://example.com/ows#roads,sep:My separator");
}

#[test]
fn given_entry_with_suffixes_when_decoding_then_all_fields_are_recovered() {
    // Act
    let config = decode_layer_param_entry("b[50]!");

    // Assert
    assert_eq!(config.kind, LayerConfigKind::Theme);
    assert_eq!(config.name, "b");
    assert_eq!(config.opacity, 128);
    assert!(!config.visibility);
}

#[test]
fn given_wms_entry_when_decoding_then_url_and_name_split_at_last_hash() {
    // Act
    let config = decode_layer_param_entry("wms:http://example.com/ows#frag#roads");

    // Assert
    assert_eq!(config.kind, LayerConfigKind::Wms);
    assert_eq!(config.url.as_deref(), Some("http://example.com/ows#frag"));
    assert_eq!(config.name, "roads");
    assert_eq!(config.opacity, 255);
    assert!(config.visibility);
}

#[test]
fn given_separator_entry_when_decoding_then_title_is_the_name() {
    // Act
    let config = decode_layer_param_entry("sep:My separator");

    // Assert
    assert_eq!(config.kind, LayerConfigKind::Separator);
    assert_eq!(config.name, "My separator");
}

#[test]
fn given_full_parameter_when_decoding_then_entries_split_on_commas() {
    // Act
    let configs = decode_layer_param("a,b[50]!,sep:x");

    // Assert
    assert_eq!(configs.len(), 3);
    assert_eq!(configs[0].name, "a");
    assert_eq!(configs[1].name, "b");
    assert_eq!(configs[2].kind, LayerConfigKind::Separator);
}

#[rstest]
#[case(0)]
#[case(64)]
#[case(128)]
#[case(191)]
#[case(255)]
fn given_grid_opacity_when_round_tripping_then_value_is_exact(#[case] opacity: u8) {
    // Arrange
    let mut a = leaf("a");
    a.opacity = opacity;
    let forest = vec![theme_root(vec![a])];

    // Act
    let configs = decode_layer_param(&encode_layer_param(&forest, false));

    // Assert
    assert_eq!(configs[0].opacity, opacity);
}

#[rstest]
#[case(1)]
#[case(100)]
#[case(200)]
#[case(254)]
fn given_any_opacity_when_round_tripping_then_value_is_close(#[case] opacity: u8) {
    // Arrange - integer percent transparency loses at most 2/255
    let mut a = leaf("a");
    a.opacity = opacity;
    let forest = vec![theme_root(vec![a])];

    // Act
    let configs = decode_layer_param(&encode_layer_param(&forest, false));

    // Assert
    let diff = (i16::from(configs[0].opacity) - i16::from(opacity)).abs();
    assert!(diff <= 2, "opacity {opacity} drifted by {diff}");
}

#[test]
fn given_background_layers_when_encoding_bl_then_visible_one_is_named() {
    // Arrange
    let mut hidden = leaf("osm");
    hidden.role = LayerRole::Background;
    hidden.visibility = false;
    let mut visible = leaf("aerial");
    visible.role = LayerRole::Background;
    let forest = vec![hidden, visible];

    // Act / Assert
    assert_eq!(background_layer_param(&forest).as_deref(), Some("aerial"));
    assert_eq!(background_layer_param(&[]), None);
}

#[test]
fn given_configs_when_restoring_then_unmentioned_leaves_are_hidden() {
    // Arrange
    let theme = theme_root(vec![leaf("a"), leaf("b")]);
    let configs = vec![theme_config("a", 128, true)];
    let mut external = HashMap::new();

    // Act
    let restored = restore_layer_params(&theme, &configs, &mut external);

    // Assert
    let entries = explode(&restored);
    let a = entries.iter().find(|e| e.leaf().name == "a").unwrap();
    assert_eq!(a.leaf().opacity, 128);
    assert!(a.leaf().visibility);
    let b = entries.iter().find(|e| e.leaf().name == "b").unwrap();
    assert!(!b.leaf().visibility);
}

#[test]
fn given_external_config_when_restoring_then_placeholder_leads_and_is_registered() {
    // Arrange
    let theme = theme_root(vec![leaf("a")]);
    let configs = vec![LayerConfig {
        id: "ext-1".to_string(),
        kind: LayerConfigKind::Wms,
        url: Some("http://example.com/ows".to_string()),
        name: "roads".to_string(),
        opacity: 200,
        visibility: true,
    }];
    let mut external = HashMap::new();

    // Act
    let restored = restore_layer_params(&theme, &configs, &mut external);

    // Assert
    assert_eq!(restored[0].kind, LayerKind::Placeholder);
    assert_eq!(restored[0].id, "ext-1");
    let refs = &external["wms:http://example.com/ows"];
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].name, "roads");
    assert_eq!(refs[0].opacity, 200);
}

#[test]
fn given_ordered_configs_when_restoring_then_config_order_wins_and_rest_is_dropped() {
    // Arrange
    let theme = theme_root(vec![leaf("a"), leaf("b"), leaf("c")]);
    let configs = vec![theme_config("c", 255, true), theme_config("a", 255, false)];
    let mut external = HashMap::new();

    // Act
    let restored = restore_ordered_layer_params(&theme, &configs, &mut external);

    // Assert
    let names: Vec<_> = explode(&restored)
        .iter()
        .map(|e| e.leaf().name.clone())
        .collect();
    assert_eq!(names, vec!["c", "a"]);
}

#[test]
fn given_group_name_in_configs_when_expanding_then_one_config_per_leaf() {
    // Arrange
    let theme = theme_root(vec![
        Layer::group("t", "g", vec![leaf("x"), leaf("y")]),
        leaf("a"),
    ]);
    let configs = vec![theme_config("g", 128, true), theme_config("a", 255, true)];

    // Act
    let expanded = replace_layer_groups(&configs, &theme);

    // Assert
    let names: Vec<_> = expanded.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "a"]);
    assert!(expanded.iter().take(2).all(|c| c.opacity == 128));
}
