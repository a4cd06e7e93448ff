//! # modgraph - Lazy Stat Aggregation over a Cascade-Safe Lifecycle Graph
//!
//! A runtime model for game/simulation stats: numeric **stats** are
//! computed from a dynamically changing set of **modifiers**, grouped
//! into **effects** that can be added, removed, and deleted as atomic
//! units, with lazy recomputation and cascading deletion semantics.
//!
//! ## Core Concepts
//!
//! ### Stat Pipeline
//!
//! ```text
//! [Modifier] → (attach) → [Stat sources] → (lazy fold) → value
//! ```
//!
//! 1. **Modifiers** carry values; writing one dirties its target stat
//! 2. **Stats** fold their sources in sorted key order when read
//! 3. **Effects** group modifiers and tear them down as one unit
//!
//! ### Key Features
//!
//! - **Lazy recomputation**: reads recompute only when the dirty flag
//!   is set; invalidation itself costs nothing
//! - **Deterministic aggregation**: sources fold in ascending key
//!   order regardless of insertion order
//! - **Cascade-safe deletion**: objects may die in any order; a
//!   failed teardown rolls back completely
//! - **Stable identities**: every object gets a process-unique id
//!   from a monotonic registry, never reused within a run
//!
//! ## Example
//!
//! ```rust
//! use modgraph::{EffectGraph, ModifierKind, SumAggregate};
//!
//! let mut graph = EffectGraph::new();
//! let hp = graph.add_stat("HP", Box::new(SumAggregate));
//!
//! let gear = graph.add_effect("gear");
//! let base = graph
//!     .add_modifier("base", ModifierKind::Referenced, 100.0, None)
//!     .unwrap();
//! let buff = graph
//!     .add_modifier("buff", ModifierKind::Referenced, 20.0, Some(gear))
//!     .unwrap();
//!
//! graph.attach(hp, base).unwrap();
//! graph.attach(hp, buff).unwrap();
//! assert_eq!(graph.value(hp).unwrap(), 120.0);
//!
//! graph.set_value(buff, 5.0).unwrap();
//! assert_eq!(graph.value(hp).unwrap(), 105.0);
//!
//! // Deleting the effect cascades into its members and detaches them.
//! graph.delete(gear).unwrap();
//! assert_eq!(graph.value(hp).unwrap(), 100.0);
//! ```
//!
//! ## Concurrency
//!
//! The whole graph is single-threaded by design: no internal locking,
//! every operation synchronous and bounded. Note that reading a value
//! recomputes the cache, so even reads mutate; embeddings that share a
//! graph across threads must wrap it in their own exclusive lock.
//!
//! ## Modules
//!
//! - [`ident`] - Identity registry (process-unique object identities)
//! - [`key`] - Caller-chosen object keys
//! - [`node`] - Handles, base capabilities, modifier kinds
//! - [`aggregate`] - Aggregation strategies
//! - [`graph`] - The effect graph itself
//! - [`snapshot`] - Serializable stat views for external encoders
//! - [`numeric`] - Value types
//! - [`error`] - Error types

pub mod aggregate;
pub mod error;
pub mod graph;
pub mod ident;
pub mod key;
pub mod node;
pub mod numeric;
pub mod snapshot;

// Re-export main types for convenience
pub use error::GraphError;
pub use graph::EffectGraph;
pub use ident::{Ident, IdentityRegistry};
pub use key::Key;
pub use snapshot::StatSnapshot;

// Re-export handles and node capabilities
pub use node::{EffectHandle, ModifierHandle, ModifierKind, ObjectRef, StatHandle};

// Re-export aggregation strategies
pub use aggregate::{Aggregate, MaxAggregate, ProductAggregate, SumAggregate};

// Re-export numeric types
pub use numeric::{StatNumeric, StatValue};
