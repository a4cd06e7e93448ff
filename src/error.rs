//! Error types for graph operations.
//!
//! All failures surfaced by [`EffectGraph`](crate::EffectGraph)
//! operations are represented by the `GraphError` enum. Errors are
//! synchronous and returned to the immediate caller; an operation
//! either completes with its invariants intact or rejects before (or
//! rolls back after) mutating anything.

use crate::ident::Ident;
use crate::key::Key;
use thiserror::Error;

/// Errors that can occur while mutating or reading the graph.
///
/// # Examples
///
/// ```rust
/// use modgraph::{GraphError, Key};
///
/// let err = GraphError::NotModifiable(Key::new("base"));
/// println!("{}", err); // "object base is not modifiable"
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// A mutation was attempted on an object whose modifiable flag is off.
    #[error("object {0} is not modifiable")]
    NotModifiable(Key),

    /// A deletion was attempted on an object whose deletable flag is off
    /// and no bypass applies.
    #[error("object {0} is not deletable")]
    NotDeletable(Key),

    /// An operation (other than idempotent detach) was attempted on an
    /// object that has already been deleted.
    #[error("object {0} has already been deleted")]
    AlreadyDeleted(Key),

    /// An attempt to attach to or reference an already-deleted effect
    /// or stat.
    #[error("cannot reference deleted object {0}")]
    DeletedObject(Key),

    /// A cleanup step raised during deletion; the deletion was rolled
    /// back and the object remains live. The inner cause is preserved.
    #[error("deletion of {key} failed and was rolled back: {source}")]
    DeletionFailed {
        key: Key,
        #[source]
        source: Box<GraphError>,
    },

    /// A stat already holds a source under the same key.
    ///
    /// Invariant-violation guard; not expected in normal operation.
    #[error("stat {stat} already has a source keyed {modifier}")]
    DuplicateSource { stat: Key, modifier: Key },

    /// Two live objects would share an identity.
    ///
    /// Invariant-violation guard; not expected in normal operation.
    #[error("identity {0} is already registered")]
    DuplicateIdentity(Ident),

    /// A handle did not resolve to any object in this graph.
    ///
    /// Deleted objects stay resident with their flags observable, so
    /// this only occurs for handles forged or taken from another graph.
    #[error("no object with identity {0} in this graph")]
    UnknownObject(Ident),

    /// Nesting an effect under one of its own members.
    ///
    /// Membership must stay acyclic or cascade deletion would not
    /// terminate.
    #[error("effect {0} cannot contain one of its own containers")]
    MembershipCycle(Key),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphError::NotModifiable(Key::new("base"));
        assert!(err.to_string().contains("base"));
        assert!(err.to_string().contains("not modifiable"));
    }

    #[test]
    fn test_deletion_failed_preserves_cause() {
        let inner = GraphError::NotDeletable(Key::new("buff"));
        let err = GraphError::DeletionFailed {
            key: Key::new("weapon-enchant"),
            source: Box::new(inner.clone()),
        };
        let display = err.to_string();
        assert!(display.contains("weapon-enchant"));
        assert!(display.contains("rolled back"));
        assert!(display.contains("buff"));

        if let GraphError::DeletionFailed { source, .. } = err {
            assert_eq!(*source, inner);
        } else {
            panic!("expected DeletionFailed");
        }
    }
}
