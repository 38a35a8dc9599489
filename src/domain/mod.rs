//! Domain layer: layer tree entities and pure tree logic
//!
//! This layer is independent of external concerns (no I/O, no CLI).

pub mod entities;
pub mod error;
pub mod path;
pub mod tree;

pub use entities::{Layer, LayerKind, LayerRole, WmsRequestParams};
pub use error::DomainError;
pub use path::{path_equal_or_below, sublayer_at, sublayer_at_mut, SublayerPath};
pub use tree::{
    assign_uuids, collect_sublayer_names, search_sublayer, sublayer_visible, validate_forest,
};
