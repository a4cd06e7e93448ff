//! Identity registry module.
//!
//! Every object managed by an [`EffectGraph`](crate::EffectGraph) is
//! assigned a process-unique [`Ident`] at construction, issued from a
//! strictly increasing counter. The registry holds the master set of
//! live identities: deletion unregisters an identity, and the counter
//! never resets, so a freed identity is never reused within a run.
//!
//! The registry is explicit, owned state (constructed at graph init and
//! passed to `EffectGraph::with_registry` if the caller wants to supply
//! its own) rather than a global singleton.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Process-unique identity of a managed graph object.
///
/// Issued by an [`IdentityRegistry`]; strictly increasing, never reused
/// while the registry lives. Two live objects never share an `Ident`.
///
/// # Examples
///
/// ```rust
/// use modgraph::IdentityRegistry;
///
/// let mut registry = IdentityRegistry::new();
/// let a = registry.register();
/// let b = registry.register();
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ident(u64);

impl Ident {
    /// Raw numeric value of this identity.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry assigning and tracking live object identities.
///
/// # Examples
///
/// ```rust
/// use modgraph::IdentityRegistry;
///
/// let mut registry = IdentityRegistry::new();
/// let id = registry.register();
/// assert!(registry.contains(id));
///
/// registry.unregister(id);
/// assert!(!registry.contains(id));
///
/// // Counter keeps counting; freed ids are never reissued.
/// let next = registry.register();
/// assert!(next > id);
/// ```
#[derive(Debug, Default, Clone)]
pub struct IdentityRegistry {
    next: u64,
    live: HashSet<Ident>,
}

impl IdentityRegistry {
    /// Create a new empty registry with the counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next identity and record it as live.
    pub fn register(&mut self) -> Ident {
        let ident = Ident(self.next);
        self.next += 1;
        self.live.insert(ident);
        ident
    }

    /// Re-insert a previously issued identity.
    ///
    /// Used when a failed deletion is rolled back: the object keeps the
    /// identity it was born with. Fails with
    /// [`GraphError::DuplicateIdentity`] if the identity is already live,
    /// which guards against registering two objects under one id.
    pub fn restore(&mut self, ident: Ident) -> Result<(), GraphError> {
        if !self.live.insert(ident) {
            return Err(GraphError::DuplicateIdentity(ident));
        }
        Ok(())
    }

    /// Remove an identity from the live set.
    ///
    /// Returns `true` if the identity was live.
    pub fn unregister(&mut self, ident: Ident) -> bool {
        self.live.remove(&ident)
    }

    /// Whether an identity is currently live.
    pub fn contains(&self, ident: Ident) -> bool {
        self.live.contains(&ident)
    }

    /// Number of live identities.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no identities are live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
