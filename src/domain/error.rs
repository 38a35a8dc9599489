//! Domain-level errors (no external dependencies)

use thiserror::Error;
use uuid::Uuid;

/// Domain errors represent structural invariant violations in a layer
/// forest. Policy rejections (stale references, boundary moves) are not
/// errors: the operations return their input unchanged instead.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("duplicate uuid in forest: {0}")]
    DuplicateUuid(Uuid),

    #[error("duplicate sublayer name '{name}' under '{parent}'")]
    DuplicateSiblingName { parent: String, name: String },
}
