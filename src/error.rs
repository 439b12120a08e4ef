//! Error taxonomy for document mutation.
//!
//! All three variants are unrecoverable within a commit: the engine does not
//! roll back, it simply never publishes a snapshot. Callers discard the failed
//! transaction and keep using the prior snapshot.

use crate::dependency::DependencyId;
use crate::entity::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Adding the edge would close a cycle in the dependency graph. A usage
    /// bug in the command sequence, never retried.
    #[error("dependency {from} -> {to} would create a cycle")]
    Cycle { from: EntityId, to: EntityId },

    /// An operation referenced an entity id missing from the working copy.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An operation referenced a dependency id missing from the graph.
    #[error("dependency not found: {0}")]
    DependencyNotFound(DependencyId),

    /// A command expected one entity kind and found another.
    #[error("expected {expected} at {id}, found {found}")]
    TypeMismatch {
        id: EntityId,
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, DocumentError>;
