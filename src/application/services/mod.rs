//! Transformation services over the layer forest

pub mod explode;
pub mod merge;
pub mod mutex;
pub mod reorder;
pub mod stack;
pub mod wms;

pub use explode::{explode, implode, ExplodedLayer};
pub use merge::merge_sublayers;
pub use mutex::ensure_mutually_exclusive;
pub use reorder::{insert_layer, insert_separator, remove_layer, reorder_layers};
pub use stack::{LayerPropertyChange, LayerStack, RecurseDirection};
pub use wms::{build_wms_params, collect_wms_sublayer_params};
