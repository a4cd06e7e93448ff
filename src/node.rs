//! Graph node primitives.
//!
//! Every node in an [`EffectGraph`](crate::EffectGraph) — stat, effect,
//! or modifier — shares the same base capability set: a registry
//! identity, a caller-chosen key, a modifiable flag, a deletable flag,
//! a monotonic deleted flag, and membership in at most one effect.
//! That shared header lives in [`NodeCore`]; the typed handles here are
//! non-owning index lookups into the graph's arena.

use crate::ident::Ident;
use crate::key::Key;
use serde::{Deserialize, Serialize};

/// Base capability set shared by every graph node.
///
/// Invariants: `deleted` is monotonic (once set it stays set); `effect`
/// is `None` or the identity of a live effect; a node belongs to at
/// most one effect at a time.
#[derive(Debug, Clone)]
pub(crate) struct NodeCore {
    pub ident: Ident,
    pub key: Key,
    pub modifiable: bool,
    pub deletable: bool,
    pub deleted: bool,
    /// Containing effect, as an identity lookup rather than a pointer,
    /// so deletion order stays safe.
    pub effect: Option<Ident>,
}

impl NodeCore {
    pub fn new(ident: Ident, key: Key) -> Self {
        Self {
            ident,
            key,
            modifiable: true,
            deletable: true,
            deleted: false,
            effect: None,
        }
    }
}

/// Handle to a stat node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatHandle(pub(crate) Ident);

/// Handle to an effect node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle(pub(crate) Ident);

/// Handle to a modifier node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierHandle(pub(crate) Ident);

impl StatHandle {
    /// Registry identity behind this handle.
    pub fn ident(self) -> Ident {
        self.0
    }
}

impl EffectHandle {
    /// Registry identity behind this handle.
    pub fn ident(self) -> Ident {
        self.0
    }
}

impl ModifierHandle {
    /// Registry identity behind this handle.
    pub fn ident(self) -> Ident {
        self.0
    }
}

/// Handle to any graph node, for operations shared by all node types
/// (deletion, flag access, effect membership).
///
/// # Examples
///
/// ```rust
/// use modgraph::{EffectGraph, ObjectRef, SumAggregate};
///
/// let mut graph = EffectGraph::new();
/// let hp = graph.add_stat("HP", Box::new(SumAggregate));
///
/// // Typed handles convert into ObjectRef
/// let obj: ObjectRef = hp.into();
/// assert_eq!(obj.ident(), hp.ident());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// A stat node.
    Stat(StatHandle),
    /// An effect node.
    Effect(EffectHandle),
    /// A modifier node.
    Modifier(ModifierHandle),
}

impl ObjectRef {
    /// Registry identity behind this reference.
    pub fn ident(self) -> Ident {
        match self {
            ObjectRef::Stat(h) => h.0,
            ObjectRef::Effect(h) => h.0,
            ObjectRef::Modifier(h) => h.0,
        }
    }
}

impl From<StatHandle> for ObjectRef {
    fn from(h: StatHandle) -> Self {
        ObjectRef::Stat(h)
    }
}

impl From<EffectHandle> for ObjectRef {
    fn from(h: EffectHandle) -> Self {
        ObjectRef::Effect(h)
    }
}

impl From<ModifierHandle> for ObjectRef {
    fn from(h: ModifierHandle) -> Self {
        ObjectRef::Modifier(h)
    }
}

/// Variant tag for modifiers.
///
/// The variant decides the deletion bypass rule: cascading teardown
/// must not deadlock on a `deletable == false` flag once the object's
/// sole reason for existing is gone.
///
/// # Examples
///
/// ```rust
/// use modgraph::ModifierKind;
///
/// // A referenced modifier whose target stat is gone may be deleted
/// // regardless of its deletable flag.
/// assert!(ModifierKind::Referenced.bypasses_deletable(true));
/// assert!(!ModifierKind::Referenced.bypasses_deletable(false));
///
/// // A simple modifier never bypasses.
/// assert!(!ModifierKind::Simple.bypasses_deletable(true));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Plain value holder; its value only changes by direct assignment.
    Simple,
    /// Carries a back-reference to its target stat for cascade cleanup.
    Referenced,
}

impl ModifierKind {
    /// Pure bypass predicate for the deletable flag.
    ///
    /// `target_gone` is true when the modifier has no target stat, or
    /// the target stat has already been deleted.
    pub fn bypasses_deletable(self, target_gone: bool) -> bool {
        match self {
            ModifierKind::Simple => false,
            ModifierKind::Referenced => target_gone,
        }
    }
}

/// One step of deletion cleanup.
///
/// Each node carries an ordered list of cleanup steps collected at
/// construction time; `delete` runs them in order after marking the
/// node deleted, and rolls the deletion back if any step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CleanupHook {
    /// Detach from the target stat's sources and re-dirty it, skipped
    /// when the stat is already deleted.
    DetachFromStat,
    /// Always fails; exercises the rollback path in tests.
    #[cfg(test)]
    Abort,
}
