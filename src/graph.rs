//! Effect graph module.
//!
//! Provides [`EffectGraph`], the central owner of every stat, effect,
//! and modifier node. All nodes live in arenas keyed by their registry
//! [`Ident`]; the public handles are index lookups, so no node holds a
//! pointer into another and deletion can happen in any order.
//!
//! The graph is a single-threaded cooperative structure: no internal
//! locking, every operation synchronous and bounded. An embedding that
//! mutates from several threads must serialize access externally —
//! reading a stat value recomputes the cache, so even `value` is a
//! mutation.
//!
//! Deleted nodes stay resident with `deleted == true` so their flags
//! remain observable, but their identities are unregistered; the
//! registry only tracks live objects.

use crate::aggregate::Aggregate;
use crate::error::GraphError;
use crate::ident::{Ident, IdentityRegistry};
use crate::key::Key;
use crate::node::{
    CleanupHook, EffectHandle, ModifierHandle, ModifierKind, NodeCore, ObjectRef, StatHandle,
};
use crate::numeric::StatValue;
use crate::snapshot::StatSnapshot;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A stat node: an aggregation point over a sorted set of modifiers.
struct StatNode {
    core: NodeCore,
    /// Sources sorted by modifier key; iteration order is the fold order.
    sources: BTreeMap<Key, Ident>,
    dirty: bool,
    cached: StatValue,
    aggregate: Box<dyn Aggregate>,
}

/// An effect node: an owning group of members, deletable as a unit.
struct EffectNode {
    core: NodeCore,
    /// Member identities; sorted so cascade order is deterministic.
    members: BTreeSet<Ident>,
}

/// A modifier node: a value contributor targeting at most one stat.
struct ModifierNode {
    core: NodeCore,
    kind: ModifierKind,
    value: StatValue,
    /// Target stat, as an identity lookup (never a pointer).
    target: Option<Ident>,
    /// Ordered cleanup steps run during deletion.
    hooks: Vec<CleanupHook>,
}

/// One reversible step taken during a deletion, journaled so a failed
/// deletion can be rolled back completely.
enum Undo {
    /// `deleted` was flipped to true.
    MarkLive(Ident),
    /// The identity was unregistered.
    Reregister(Ident),
    /// A source entry was removed from a stat and the modifier's
    /// target cleared.
    Reattach {
        stat: Ident,
        key: Key,
        modifier: Ident,
    },
    /// Membership in an effect was removed.
    Remember { effect: Ident, member: Ident },
}

/// The stat/effect/modifier graph.
///
/// Owns all nodes and the identity registry. Client code creates
/// stats, effects, and modifiers, attaches modifiers to stats, and the
/// graph keeps the lazy dirty-flag bookkeeping and cascade-safe
/// deletion semantics consistent.
///
/// # Examples
///
/// ```rust
/// use modgraph::{EffectGraph, ModifierKind, SumAggregate};
///
/// let mut graph = EffectGraph::new();
/// let hp = graph.add_stat("HP", Box::new(SumAggregate));
///
/// let base = graph
///     .add_modifier("base", ModifierKind::Referenced, 100.0, None)
///     .unwrap();
/// let buff = graph
///     .add_modifier("buff", ModifierKind::Referenced, 20.0, None)
///     .unwrap();
/// graph.attach(hp, base).unwrap();
/// graph.attach(hp, buff).unwrap();
/// assert_eq!(graph.value(hp).unwrap(), 120.0);
///
/// // Writing a modifier dirties the stat; the next read recomputes.
/// graph.set_value(buff, 5.0).unwrap();
/// assert_eq!(graph.value(hp).unwrap(), 105.0);
///
/// // Deleting a modifier detaches it and re-dirties the stat.
/// graph.delete(buff).unwrap();
/// assert_eq!(graph.value(hp).unwrap(), 100.0);
/// ```
pub struct EffectGraph {
    registry: IdentityRegistry,
    stats: HashMap<Ident, StatNode>,
    effects: HashMap<Ident, EffectNode>,
    modifiers: HashMap<Ident, ModifierNode>,
}

impl EffectGraph {
    /// Create a graph with its own fresh identity registry.
    pub fn new() -> Self {
        Self::with_registry(IdentityRegistry::new())
    }

    /// Create a graph over a caller-supplied registry.
    ///
    /// Lets an embedding keep identity issuance under its own control
    /// (one registry per simulation instance, initialized at startup).
    pub fn with_registry(registry: IdentityRegistry) -> Self {
        Self {
            registry,
            stats: HashMap::new(),
            effects: HashMap::new(),
            modifiers: HashMap::new(),
        }
    }

    // ----- construction -------------------------------------------------

    /// Create a stat with the given aggregation strategy.
    ///
    /// The stat starts dirty with an empty source set, so its first
    /// read evaluates to the strategy's identity.
    pub fn add_stat(&mut self, key: impl Into<Key>, aggregate: Box<dyn Aggregate>) -> StatHandle {
        let ident = self.registry.register();
        let cached = aggregate.identity();
        let node = StatNode {
            core: NodeCore::new(ident, key.into()),
            sources: BTreeMap::new(),
            dirty: true,
            cached,
            aggregate,
        };
        self.stats.insert(ident, node);
        StatHandle(ident)
    }

    /// Create an empty effect.
    pub fn add_effect(&mut self, key: impl Into<Key>) -> EffectHandle {
        let ident = self.registry.register();
        let node = EffectNode {
            core: NodeCore::new(ident, key.into()),
            members: BTreeSet::new(),
        };
        self.effects.insert(ident, node);
        EffectHandle(ident)
    }

    /// Create a modifier, optionally as a member of an effect.
    ///
    /// Fails with [`GraphError::DeletedObject`] if the owner effect has
    /// already been deleted.
    pub fn add_modifier(
        &mut self,
        key: impl Into<Key>,
        kind: ModifierKind,
        value: StatValue,
        effect: Option<EffectHandle>,
    ) -> Result<ModifierHandle, GraphError> {
        if let Some(owner) = effect {
            let node = self
                .effects
                .get(&owner.0)
                .ok_or(GraphError::UnknownObject(owner.0))?;
            if node.core.deleted {
                return Err(GraphError::DeletedObject(node.core.key.clone()));
            }
        }

        let ident = self.registry.register();
        let mut core = NodeCore::new(ident, key.into());
        core.effect = effect.map(|e| e.0);
        let node = ModifierNode {
            core,
            kind,
            value,
            target: None,
            hooks: vec![CleanupHook::DetachFromStat],
        };
        self.modifiers.insert(ident, node);

        if let Some(owner) = effect {
            if let Some(e) = self.effects.get_mut(&owner.0) {
                e.members.insert(ident);
            }
        }
        Ok(ModifierHandle(ident))
    }

    // ----- effect membership --------------------------------------------

    /// Move an object into an effect (or out of any, with `None`).
    ///
    /// Requires the object and both the old and new effect (when
    /// present and live) to be modifiable. Fails with
    /// [`GraphError::DeletedObject`] if the new effect is deleted, and
    /// with [`GraphError::MembershipCycle`] if the move would nest an
    /// effect inside itself.
    ///
    /// Membership mutation happens only here and in deletion, which
    /// keeps the one-owner invariant: an object belongs to at most one
    /// effect, and only membership transitions touch the member sets.
    pub fn set_effect(
        &mut self,
        obj: impl Into<ObjectRef>,
        effect: Option<EffectHandle>,
    ) -> Result<(), GraphError> {
        let obj = obj.into();
        let ident = obj.ident();
        let (key, old_effect, modifiable, deleted) = {
            let core = self.core(ident)?;
            (
                core.key.clone(),
                core.effect,
                core.modifiable,
                core.deleted,
            )
        };
        if deleted {
            return Err(GraphError::AlreadyDeleted(key));
        }
        if !modifiable {
            return Err(GraphError::NotModifiable(key));
        }

        if let Some(old) = old_effect {
            if let Some(node) = self.effects.get(&old) {
                if !node.core.deleted && !node.core.modifiable {
                    return Err(GraphError::NotModifiable(node.core.key.clone()));
                }
            }
        }

        if let Some(new) = effect {
            let node = self
                .effects
                .get(&new.0)
                .ok_or(GraphError::UnknownObject(new.0))?;
            if node.core.deleted {
                return Err(GraphError::DeletedObject(node.core.key.clone()));
            }
            if !node.core.modifiable {
                return Err(GraphError::NotModifiable(node.core.key.clone()));
            }
            if matches!(obj, ObjectRef::Effect(_)) {
                // walk the new container's ancestry; nesting an effect
                // under itself would make cascades non-terminating
                let mut cursor = Some(new.0);
                while let Some(id) = cursor {
                    if id == ident {
                        return Err(GraphError::MembershipCycle(key));
                    }
                    cursor = self.effects.get(&id).and_then(|n| n.core.effect);
                }
            }
        }

        if let Some(old) = old_effect {
            if let Some(node) = self.effects.get_mut(&old) {
                node.members.remove(&ident);
            }
        }
        if let Some(new) = effect {
            if let Some(node) = self.effects.get_mut(&new.0) {
                node.members.insert(ident);
            }
        }
        if let Ok(core) = self.core_mut(ident) {
            core.effect = effect.map(|e| e.0);
        }
        Ok(())
    }

    // ----- attachment ---------------------------------------------------

    /// Attach a modifier to a stat as one of its sources.
    ///
    /// Inserts the modifier into the stat's sorted source set under the
    /// modifier's key, sets the modifier's target back-reference, and
    /// dirties the stat. A modifier already attached elsewhere is moved
    /// (detached from its previous target first).
    ///
    /// Fails with [`GraphError::DuplicateSource`] if the stat already
    /// holds a source under that key, and with
    /// [`GraphError::DeletedObject`] if the stat is deleted.
    pub fn attach(&mut self, stat: StatHandle, modifier: ModifierHandle) -> Result<(), GraphError> {
        let (stat_key, stat_deleted) = {
            let node = self
                .stats
                .get(&stat.0)
                .ok_or(GraphError::UnknownObject(stat.0))?;
            (node.core.key.clone(), node.core.deleted)
        };
        if stat_deleted {
            return Err(GraphError::DeletedObject(stat_key));
        }

        let (mod_key, mod_deleted, old_target) = {
            let node = self
                .modifiers
                .get(&modifier.0)
                .ok_or(GraphError::UnknownObject(modifier.0))?;
            (node.core.key.clone(), node.core.deleted, node.target)
        };
        if mod_deleted {
            return Err(GraphError::AlreadyDeleted(mod_key));
        }

        let occupied = self
            .stats
            .get(&stat.0)
            .map(|s| s.sources.contains_key(&mod_key))
            .unwrap_or(false);
        if occupied {
            return Err(GraphError::DuplicateSource {
                stat: stat_key,
                modifier: mod_key,
            });
        }

        if let Some(old) = old_target {
            self.detach_source(old, modifier.0);
        }

        if let Some(node) = self.stats.get_mut(&stat.0) {
            node.sources.insert(mod_key, modifier.0);
            node.dirty = true;
        }
        if let Some(node) = self.modifiers.get_mut(&modifier.0) {
            node.target = Some(stat.0);
        }
        Ok(())
    }

    /// Detach a modifier from a stat.
    ///
    /// Idempotent: detaching a modifier that is not attached to the
    /// stat is a no-op. When the stat has already been deleted the
    /// stat-side removal and re-dirty are skipped (the stat is going
    /// away anyway); the modifier's back-reference is still cleared.
    pub fn detach(&mut self, stat: StatHandle, modifier: ModifierHandle) -> Result<(), GraphError> {
        if !self.stats.contains_key(&stat.0) {
            return Err(GraphError::UnknownObject(stat.0));
        }
        let target = self
            .modifiers
            .get(&modifier.0)
            .ok_or(GraphError::UnknownObject(modifier.0))?
            .target;
        if target == Some(stat.0) {
            self.detach_source(stat.0, modifier.0);
        }
        Ok(())
    }

    /// Remove `modifier` from `stat`'s sources (if the stat is live and
    /// actually holds it), dirty the stat, and clear the back-reference.
    fn detach_source(&mut self, stat: Ident, modifier: Ident) {
        let key = match self.modifiers.get(&modifier) {
            Some(node) => node.core.key.clone(),
            None => return,
        };
        if let Some(node) = self.stats.get_mut(&stat) {
            if !node.core.deleted && node.sources.get(&key) == Some(&modifier) {
                node.sources.remove(&key);
                node.dirty = true;
            }
        }
        if let Some(node) = self.modifiers.get_mut(&modifier) {
            node.target = None;
        }
    }

    // ----- lazy value ---------------------------------------------------

    /// Mark a stat's cache as stale.
    ///
    /// Pure invalidation: idempotent, never recomputes. Recomputation
    /// is deferred to the next [`value`](EffectGraph::value) read.
    pub fn signal_update(&mut self, stat: StatHandle) -> Result<(), GraphError> {
        let node = self
            .stats
            .get_mut(&stat.0)
            .ok_or(GraphError::UnknownObject(stat.0))?;
        if node.core.deleted {
            return Err(GraphError::AlreadyDeleted(node.core.key.clone()));
        }
        node.dirty = true;
        Ok(())
    }

    /// Read a stat's value, recomputing if the cache is stale.
    ///
    /// Recomputation folds over the sources in ascending key order, so
    /// the result is deterministic even for non-commutative strategies.
    pub fn value(&mut self, stat: StatHandle) -> Result<StatValue, GraphError> {
        let node = self
            .stats
            .get(&stat.0)
            .ok_or(GraphError::UnknownObject(stat.0))?;
        if node.core.deleted {
            return Err(GraphError::AlreadyDeleted(node.core.key.clone()));
        }
        if !node.dirty {
            return Ok(node.cached);
        }

        let mut acc = node.aggregate.identity();
        for source in node.sources.values() {
            let contribution = self
                .modifiers
                .get(source)
                .ok_or(GraphError::UnknownObject(*source))?
                .value;
            acc = node.aggregate.fold(acc, contribution);
        }
        if let Some(node) = self.stats.get_mut(&stat.0) {
            node.cached = acc;
            node.dirty = false;
        }
        Ok(acc)
    }

    /// Whether a stat's cache is currently stale.
    pub fn is_dirty(&self, stat: StatHandle) -> Result<bool, GraphError> {
        self.stats
            .get(&stat.0)
            .map(|n| n.dirty)
            .ok_or(GraphError::UnknownObject(stat.0))
    }

    /// Take a serializable snapshot of a stat, recomputing first so the
    /// value reflects all current sources.
    pub fn snapshot(&mut self, stat: StatHandle) -> Result<StatSnapshot, GraphError> {
        let value = self.value(stat)?;
        let node = self
            .stats
            .get(&stat.0)
            .ok_or(GraphError::UnknownObject(stat.0))?;
        let mut snapshot = StatSnapshot::new(node.core.key.clone(), value);
        for (key, source) in &node.sources {
            let contribution = self
                .modifiers
                .get(source)
                .ok_or(GraphError::UnknownObject(*source))?
                .value;
            snapshot.add_source(key.clone(), contribution);
        }
        Ok(snapshot)
    }

    // ----- modifier value -----------------------------------------------

    /// Write a modifier's value and signal its target stat.
    ///
    /// Fails with [`GraphError::NotModifiable`] when the modifiable
    /// flag is off; the target's cached value is left untouched.
    pub fn set_value(&mut self, modifier: ModifierHandle, value: StatValue) -> Result<(), GraphError> {
        let node = self
            .modifiers
            .get_mut(&modifier.0)
            .ok_or(GraphError::UnknownObject(modifier.0))?;
        if node.core.deleted {
            return Err(GraphError::AlreadyDeleted(node.core.key.clone()));
        }
        if !node.core.modifiable {
            return Err(GraphError::NotModifiable(node.core.key.clone()));
        }
        node.value = value;

        if let Some(target) = node.target {
            if let Some(stat) = self.stats.get_mut(&target) {
                if !stat.core.deleted {
                    stat.dirty = true;
                }
            }
        }
        Ok(())
    }

    /// Read a modifier's current value.
    pub fn modifier_value(&self, modifier: ModifierHandle) -> Result<StatValue, GraphError> {
        self.modifiers
            .get(&modifier.0)
            .map(|n| n.value)
            .ok_or(GraphError::UnknownObject(modifier.0))
    }

    /// The stat a modifier is attached to, if any.
    pub fn target_of(&self, modifier: ModifierHandle) -> Result<Option<StatHandle>, GraphError> {
        self.modifiers
            .get(&modifier.0)
            .map(|n| n.target.map(StatHandle))
            .ok_or(GraphError::UnknownObject(modifier.0))
    }

    // ----- deletion -----------------------------------------------------

    /// Delete an object, cascading through effect members.
    ///
    /// Deletion is all-or-nothing. Preconditions (already deleted, not
    /// deletable without an authorizing cascade or bypass) are checked
    /// for the object and every cascade member before anything mutates.
    /// Every mutation after that point is journaled; if a cleanup step
    /// still fails, the journal is replayed in reverse and the failure
    /// surfaces as [`GraphError::DeletionFailed`] with the object and
    /// all cascade members live again.
    ///
    /// On success the object (and, for effects, every member) ends with
    /// `deleted == true`, its identity unregistered, detached from its
    /// containing effect. A deleted modifier is detached from its
    /// target stat, which is re-dirtied — unless the stat is itself
    /// already deleted, in which case the stat side is skipped.
    ///
    /// Stats never force the deletion of their sources: deleting a stat
    /// leaves its modifiers alive, and their later deletion bypasses
    /// the deletable flag (for [`ModifierKind::Referenced`]) because
    /// the target is gone.
    pub fn delete(&mut self, obj: impl Into<ObjectRef>) -> Result<(), GraphError> {
        let ident = obj.into().ident();
        self.check_delete(ident, false)?;

        let mut journal = Vec::new();
        match self.apply_delete(ident, &mut journal) {
            Ok(()) => Ok(()),
            Err(cause) => {
                let key = self
                    .core(ident)
                    .map(|c| c.key.clone())
                    .unwrap_or_else(|_| Key::new("<unknown>"));
                self.rollback(journal);
                Err(GraphError::DeletionFailed {
                    key,
                    source: Box::new(cause),
                })
            }
        }
    }

    /// Precondition pass: verify the object and (recursively) every
    /// cascade member may be deleted, without mutating anything.
    fn check_delete(&self, ident: Ident, cascade: bool) -> Result<(), GraphError> {
        let core = self.core(ident)?;
        if core.deleted {
            return Err(GraphError::AlreadyDeleted(core.key.clone()));
        }
        if !core.deletable && !cascade && !self.bypasses_deletable(ident) {
            return Err(GraphError::NotDeletable(core.key.clone()));
        }
        if let Some(effect) = self.effects.get(&ident) {
            for member in &effect.members {
                // members are authorized by the cascade's root
                self.check_delete(*member, true)?;
            }
        }
        Ok(())
    }

    /// Per-kind bypass of the deletable flag.
    fn bypasses_deletable(&self, ident: Ident) -> bool {
        match self.modifiers.get(&ident) {
            Some(node) => {
                let target_gone = match node.target {
                    None => true,
                    Some(target) => self
                        .stats
                        .get(&target)
                        .map(|s| s.core.deleted)
                        .unwrap_or(true),
                };
                node.kind.bypasses_deletable(target_gone)
            }
            None => false,
        }
    }

    /// Commit pass: members first (for effects), then the object
    /// itself. Every mutation is journaled for rollback.
    fn apply_delete(&mut self, ident: Ident, journal: &mut Vec<Undo>) -> Result<(), GraphError> {
        let members: Vec<Ident> = self
            .effects
            .get(&ident)
            .map(|e| e.members.iter().copied().collect())
            .unwrap_or_default();
        for member in members {
            self.apply_delete(member, journal)?;
        }

        self.core_mut(ident)?.deleted = true;
        journal.push(Undo::MarkLive(ident));

        let hooks: Vec<CleanupHook> = self
            .modifiers
            .get(&ident)
            .map(|m| m.hooks.clone())
            .unwrap_or_default();
        for hook in hooks {
            self.run_hook(ident, hook, journal)?;
        }

        if self.registry.unregister(ident) {
            journal.push(Undo::Reregister(ident));
        }

        let owner = self.core(ident)?.effect;
        if let Some(effect) = owner {
            if let Some(node) = self.effects.get_mut(&effect) {
                if node.members.remove(&ident) {
                    journal.push(Undo::Remember {
                        effect,
                        member: ident,
                    });
                }
            }
            if let Ok(core) = self.core_mut(ident) {
                core.effect = None;
            }
        }
        Ok(())
    }

    /// Run one cleanup step of a deleting node.
    fn run_hook(
        &mut self,
        ident: Ident,
        hook: CleanupHook,
        journal: &mut Vec<Undo>,
    ) -> Result<(), GraphError> {
        match hook {
            CleanupHook::DetachFromStat => {
                let target = self.modifiers.get(&ident).and_then(|m| m.target);
                let Some(stat) = target else {
                    return Ok(());
                };
                let live = self
                    .stats
                    .get(&stat)
                    .map(|s| !s.core.deleted)
                    .unwrap_or(false);
                if !live {
                    // cascade-from-above: the stat's own teardown
                    // already covers it, nothing to detach or signal
                    return Ok(());
                }
                let key = self
                    .modifiers
                    .get(&ident)
                    .map(|m| m.core.key.clone())
                    .ok_or(GraphError::UnknownObject(ident))?;
                if let Some(node) = self.stats.get_mut(&stat) {
                    if node.sources.get(&key) == Some(&ident) {
                        node.sources.remove(&key);
                        node.dirty = true;
                    }
                }
                if let Some(node) = self.modifiers.get_mut(&ident) {
                    node.target = None;
                }
                journal.push(Undo::Reattach {
                    stat,
                    key,
                    modifier: ident,
                });
                Ok(())
            }
            #[cfg(test)]
            CleanupHook::Abort => {
                let key = self
                    .core(ident)
                    .map(|c| c.key.clone())
                    .unwrap_or_else(|_| Key::new("<unknown>"));
                Err(GraphError::NotDeletable(key))
            }
        }
    }

    /// Replay a deletion journal in reverse, restoring every touched
    /// invariant: deleted flags, registry entries, source attachments,
    /// effect memberships.
    fn rollback(&mut self, journal: Vec<Undo>) {
        for entry in journal.into_iter().rev() {
            match entry {
                Undo::MarkLive(ident) => {
                    if let Ok(core) = self.core_mut(ident) {
                        core.deleted = false;
                    }
                }
                Undo::Reregister(ident) => {
                    // the identity was live before the deletion started,
                    // so restoring it cannot collide
                    let _ = self.registry.restore(ident);
                }
                Undo::Reattach {
                    stat,
                    key,
                    modifier,
                } => {
                    if let Some(node) = self.stats.get_mut(&stat) {
                        node.sources.insert(key, modifier);
                        node.dirty = true;
                    }
                    if let Some(node) = self.modifiers.get_mut(&modifier) {
                        node.target = Some(stat);
                    }
                }
                Undo::Remember { effect, member } => {
                    if let Some(node) = self.effects.get_mut(&effect) {
                        node.members.insert(member);
                    }
                    if let Ok(core) = self.core_mut(member) {
                        core.effect = Some(effect);
                    }
                }
            }
        }
    }

    // ----- shared capability accessors ----------------------------------

    /// Caller-chosen key of an object.
    pub fn key(&self, obj: impl Into<ObjectRef>) -> Result<Key, GraphError> {
        self.core(obj.into().ident()).map(|c| c.key.clone())
    }

    /// Whether an object is live (registered and not deleted).
    pub fn contains(&self, obj: impl Into<ObjectRef>) -> bool {
        self.registry.contains(obj.into().ident())
    }

    /// Whether an object has been deleted.
    pub fn is_deleted(&self, obj: impl Into<ObjectRef>) -> Result<bool, GraphError> {
        self.core(obj.into().ident()).map(|c| c.deleted)
    }

    /// Whether an object may be mutated.
    pub fn is_modifiable(&self, obj: impl Into<ObjectRef>) -> Result<bool, GraphError> {
        self.core(obj.into().ident()).map(|c| c.modifiable)
    }

    /// Flip an object's modifiable flag.
    pub fn set_modifiable(
        &mut self,
        obj: impl Into<ObjectRef>,
        modifiable: bool,
    ) -> Result<(), GraphError> {
        let core = self.core_mut(obj.into().ident())?;
        if core.deleted {
            return Err(GraphError::AlreadyDeleted(core.key.clone()));
        }
        core.modifiable = modifiable;
        Ok(())
    }

    /// Whether an object may be deleted outside a cascade or bypass.
    pub fn is_deletable(&self, obj: impl Into<ObjectRef>) -> Result<bool, GraphError> {
        self.core(obj.into().ident()).map(|c| c.deletable)
    }

    /// Flip an object's deletable flag.
    pub fn set_deletable(
        &mut self,
        obj: impl Into<ObjectRef>,
        deletable: bool,
    ) -> Result<(), GraphError> {
        let core = self.core_mut(obj.into().ident())?;
        if core.deleted {
            return Err(GraphError::AlreadyDeleted(core.key.clone()));
        }
        core.deletable = deletable;
        Ok(())
    }

    /// The effect containing an object, if any.
    pub fn effect_of(&self, obj: impl Into<ObjectRef>) -> Result<Option<EffectHandle>, GraphError> {
        self.core(obj.into().ident())
            .map(|c| c.effect.map(EffectHandle))
    }

    /// Current members of an effect, in identity order.
    pub fn members(&self, effect: EffectHandle) -> Result<Vec<ObjectRef>, GraphError> {
        let node = self
            .effects
            .get(&effect.0)
            .ok_or(GraphError::UnknownObject(effect.0))?;
        node.members
            .iter()
            .map(|ident| self.object_ref(*ident))
            .collect()
    }

    /// Current sources of a stat, in key order.
    pub fn sources(&self, stat: StatHandle) -> Result<Vec<(Key, ModifierHandle)>, GraphError> {
        let node = self
            .stats
            .get(&stat.0)
            .ok_or(GraphError::UnknownObject(stat.0))?;
        Ok(node
            .sources
            .iter()
            .map(|(key, ident)| (key.clone(), ModifierHandle(*ident)))
            .collect())
    }

    /// Number of live objects across the whole graph.
    pub fn live_count(&self) -> usize {
        self.registry.len()
    }

    // ----- internals ----------------------------------------------------

    fn core(&self, ident: Ident) -> Result<&NodeCore, GraphError> {
        if let Some(node) = self.stats.get(&ident) {
            return Ok(&node.core);
        }
        if let Some(node) = self.effects.get(&ident) {
            return Ok(&node.core);
        }
        if let Some(node) = self.modifiers.get(&ident) {
            return Ok(&node.core);
        }
        Err(GraphError::UnknownObject(ident))
    }

    fn core_mut(&mut self, ident: Ident) -> Result<&mut NodeCore, GraphError> {
        if let Some(node) = self.stats.get_mut(&ident) {
            return Ok(&mut node.core);
        }
        if let Some(node) = self.effects.get_mut(&ident) {
            return Ok(&mut node.core);
        }
        if let Some(node) = self.modifiers.get_mut(&ident) {
            return Ok(&mut node.core);
        }
        Err(GraphError::UnknownObject(ident))
    }

    fn object_ref(&self, ident: Ident) -> Result<ObjectRef, GraphError> {
        if self.stats.contains_key(&ident) {
            return Ok(ObjectRef::Stat(StatHandle(ident)));
        }
        if self.effects.contains_key(&ident) {
            return Ok(ObjectRef::Effect(EffectHandle(ident)));
        }
        if self.modifiers.contains_key(&ident) {
            return Ok(ObjectRef::Modifier(ModifierHandle(ident)));
        }
        Err(GraphError::UnknownObject(ident))
    }
}

impl Default for EffectGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SumAggregate;

    fn sum_stat(graph: &mut EffectGraph, key: &str) -> StatHandle {
        graph.add_stat(key, Box::new(SumAggregate))
    }

    fn referenced(graph: &mut EffectGraph, key: &str, value: StatValue) -> ModifierHandle {
        graph
            .add_modifier(key, ModifierKind::Referenced, value, None)
            .unwrap()
    }

    #[test]
    fn test_attach_and_value() {
        let mut graph = EffectGraph::new();
        let hp = sum_stat(&mut graph, "HP");
        let base = referenced(&mut graph, "base", 100.0);
        let buff = referenced(&mut graph, "buff", 20.0);

        graph.attach(hp, base).unwrap();
        graph.attach(hp, buff).unwrap();
        assert_eq!(graph.value(hp).unwrap(), 120.0);
        assert!(!graph.is_dirty(hp).unwrap());
    }

    #[test]
    fn test_value_write_dirties_target() {
        let mut graph = EffectGraph::new();
        let hp = sum_stat(&mut graph, "HP");
        let buff = referenced(&mut graph, "buff", 20.0);
        graph.attach(hp, buff).unwrap();
        let _ = graph.value(hp).unwrap();

        graph.set_value(buff, 5.0).unwrap();
        assert!(graph.is_dirty(hp).unwrap());
        assert_eq!(graph.value(hp).unwrap(), 5.0);
    }

    #[test]
    fn test_duplicate_source_key_rejected() {
        let mut graph = EffectGraph::new();
        let hp = sum_stat(&mut graph, "HP");
        let a = referenced(&mut graph, "buff", 10.0);
        let b = referenced(&mut graph, "buff", 20.0);

        graph.attach(hp, a).unwrap();
        let err = graph.attach(hp, b).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateSource { .. }));
        // the stat still aggregates only the first
        assert_eq!(graph.value(hp).unwrap(), 10.0);
    }

    #[test]
    fn test_attach_moves_between_stats() {
        let mut graph = EffectGraph::new();
        let hp = sum_stat(&mut graph, "HP");
        let mp = sum_stat(&mut graph, "MP");
        let m = referenced(&mut graph, "regen", 10.0);

        graph.attach(hp, m).unwrap();
        assert_eq!(graph.value(hp).unwrap(), 10.0);

        graph.attach(mp, m).unwrap();
        assert_eq!(graph.target_of(m).unwrap(), Some(mp));
        assert_eq!(graph.value(hp).unwrap(), 0.0);
        assert_eq!(graph.value(mp).unwrap(), 10.0);
    }

    #[test]
    fn test_detach_idempotent() {
        let mut graph = EffectGraph::new();
        let hp = sum_stat(&mut graph, "HP");
        let m = referenced(&mut graph, "buff", 10.0);
        graph.attach(hp, m).unwrap();

        graph.detach(hp, m).unwrap();
        graph.detach(hp, m).unwrap();
        assert_eq!(graph.target_of(m).unwrap(), None);
        assert_eq!(graph.value(hp).unwrap(), 0.0);
    }

    #[test]
    fn test_set_effect_requires_modifiable() {
        let mut graph = EffectGraph::new();
        let aura = graph.add_effect("aura");
        let m = referenced(&mut graph, "buff", 10.0);

        graph.set_modifiable(m, false).unwrap();
        let err = graph.set_effect(m, Some(aura)).unwrap_err();
        assert!(matches!(err, GraphError::NotModifiable(_)));

        graph.set_modifiable(m, true).unwrap();
        graph.set_effect(m, Some(aura)).unwrap();
        assert_eq!(graph.effect_of(m).unwrap(), Some(aura));
        assert_eq!(graph.members(aura).unwrap().len(), 1);
    }

    #[test]
    fn test_set_effect_rejects_deleted_container() {
        let mut graph = EffectGraph::new();
        let aura = graph.add_effect("aura");
        let m = referenced(&mut graph, "buff", 10.0);

        graph.delete(aura).unwrap();
        let err = graph.set_effect(m, Some(aura)).unwrap_err();
        assert!(matches!(err, GraphError::DeletedObject(_)));
    }

    #[test]
    fn test_nested_effect_cycle_rejected() {
        let mut graph = EffectGraph::new();
        let outer = graph.add_effect("outer");
        let inner = graph.add_effect("inner");

        graph.set_effect(inner, Some(outer)).unwrap();
        let err = graph.set_effect(outer, Some(inner)).unwrap_err();
        assert!(matches!(err, GraphError::MembershipCycle(_)));

        let err = graph.set_effect(outer, Some(outer)).unwrap_err();
        assert!(matches!(err, GraphError::MembershipCycle(_)));
    }

    #[test]
    fn test_cascade_deletes_nested_effects() {
        let mut graph = EffectGraph::new();
        let outer = graph.add_effect("outer");
        let inner = graph.add_effect("inner");
        graph.set_effect(inner, Some(outer)).unwrap();
        let m = graph
            .add_modifier("buff", ModifierKind::Referenced, 10.0, Some(inner))
            .unwrap();

        graph.delete(outer).unwrap();
        assert!(graph.is_deleted(outer).unwrap());
        assert!(graph.is_deleted(inner).unwrap());
        assert!(graph.is_deleted(m).unwrap());
        assert_eq!(graph.live_count(), 0);
    }

    #[test]
    fn test_hook_failure_rolls_back_cascade() {
        let mut graph = EffectGraph::new();
        let aura = graph.add_effect("aura");
        let hp = sum_stat(&mut graph, "HP");
        let m1 = graph
            .add_modifier("m1", ModifierKind::Referenced, 10.0, Some(aura))
            .unwrap();
        let m2 = graph
            .add_modifier("m2", ModifierKind::Referenced, 20.0, Some(aura))
            .unwrap();
        graph.attach(hp, m1).unwrap();
        graph.attach(hp, m2).unwrap();
        let _ = graph.value(hp).unwrap();

        // force the second member's cleanup to fail
        if let Some(node) = graph.modifiers.get_mut(&m2.0) {
            node.hooks.push(CleanupHook::Abort);
        }

        let err = graph.delete(aura).unwrap_err();
        assert!(matches!(err, GraphError::DeletionFailed { .. }));

        // the whole cascade rolled back: everything live and re-attached
        assert!(!graph.is_deleted(aura).unwrap());
        assert!(!graph.is_deleted(m1).unwrap());
        assert!(!graph.is_deleted(m2).unwrap());
        assert!(graph.contains(m1));
        assert!(graph.contains(m2));
        assert_eq!(graph.effect_of(m1).unwrap(), Some(aura));
        assert_eq!(graph.members(aura).unwrap().len(), 2);
        assert_eq!(graph.value(hp).unwrap(), 30.0);
    }

    #[test]
    fn test_hook_failure_rolls_back_single_delete() {
        let mut graph = EffectGraph::new();
        let hp = sum_stat(&mut graph, "HP");
        let m = referenced(&mut graph, "buff", 10.0);
        graph.attach(hp, m).unwrap();

        if let Some(node) = graph.modifiers.get_mut(&m.0) {
            node.hooks.push(CleanupHook::Abort);
        }

        let err = graph.delete(m).unwrap_err();
        match err {
            GraphError::DeletionFailed { key, source } => {
                assert_eq!(key.as_str(), "buff");
                assert!(matches!(*source, GraphError::NotDeletable(_)));
            }
            other => panic!("expected DeletionFailed, got {other:?}"),
        }

        assert!(!graph.is_deleted(m).unwrap());
        assert!(graph.contains(m));
        assert_eq!(graph.target_of(m).unwrap(), Some(hp));
        assert_eq!(graph.value(hp).unwrap(), 10.0);
    }

    #[test]
    fn test_not_deletable_outside_cascade() {
        let mut graph = EffectGraph::new();
        let hp = sum_stat(&mut graph, "HP");
        let m = referenced(&mut graph, "buff", 10.0);
        graph.attach(hp, m).unwrap();

        graph.set_deletable(m, false).unwrap();
        let err = graph.delete(m).unwrap_err();
        assert!(matches!(err, GraphError::NotDeletable(_)));

        // once the target stat is gone the referenced bypass applies
        graph.delete(hp).unwrap();
        graph.delete(m).unwrap();
        assert!(graph.is_deleted(m).unwrap());
    }

    #[test]
    fn test_simple_kind_never_bypasses() {
        let mut graph = EffectGraph::new();
        let m = graph
            .add_modifier("flat", ModifierKind::Simple, 5.0, None)
            .unwrap();
        graph.set_deletable(m, false).unwrap();

        // no target at all, but a simple modifier still honors the flag
        let err = graph.delete(m).unwrap_err();
        assert!(matches!(err, GraphError::NotDeletable(_)));
    }

    #[test]
    fn test_double_delete_rejected() {
        let mut graph = EffectGraph::new();
        let m = referenced(&mut graph, "buff", 10.0);
        graph.delete(m).unwrap();
        let err = graph.delete(m).unwrap_err();
        assert!(matches!(err, GraphError::AlreadyDeleted(_)));
    }

    #[test]
    fn test_forged_handle_rejected() {
        let mut other = EffectGraph::new();
        for _ in 0..5 {
            let _ = other.add_effect("filler");
        }
        let foreign = other.add_effect("foreign");

        let graph = EffectGraph::new();
        let err = graph.key(foreign).unwrap_err();
        assert!(matches!(err, GraphError::UnknownObject(_)));
    }
}
