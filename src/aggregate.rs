//! Aggregation strategies module.
//!
//! A stat folds the values of its sources into a single cached value
//! using an [`Aggregate`] strategy chosen at construction. Strategies
//! are stateless and deterministic; the fold always runs over sources
//! in ascending key order, so non-commutative strategies produce the
//! same result regardless of insertion order.

use crate::numeric::{StatNumeric, StatValue};

/// Trait for strategies combining source values into a stat value.
///
/// The fold starts from [`identity`](Aggregate::identity) and applies
/// [`fold`](Aggregate::fold) once per source, in ascending key order.
/// A stat with no sources evaluates to the identity.
///
/// # Examples
///
/// ```rust
/// use modgraph::{Aggregate, SumAggregate};
///
/// let sum = SumAggregate;
/// let mut acc = sum.identity();
/// for v in [100.0, 20.0] {
///     acc = sum.fold(acc, v);
/// }
/// assert_eq!(acc, 120.0);
/// ```
pub trait Aggregate: Send + Sync {
    /// Starting value of the fold (the value of a stat with no sources).
    fn identity(&self) -> StatValue;

    /// Combine the accumulator with one source's contribution.
    fn fold(&self, acc: StatValue, contribution: StatValue) -> StatValue;

    /// Human-readable description of this strategy.
    fn description(&self) -> String;
}

/// Additive aggregation: the stat value is the sum of its sources.
///
/// This is the default strategy.
///
/// # Examples
///
/// ```rust
/// use modgraph::{EffectGraph, ModifierKind, SumAggregate};
///
/// let mut graph = EffectGraph::new();
/// let hp = graph.add_stat("HP", Box::new(SumAggregate));
/// let base = graph
///     .add_modifier("base", ModifierKind::Referenced, 100.0, None)
///     .unwrap();
/// graph.attach(hp, base).unwrap();
/// assert_eq!(graph.value(hp).unwrap(), 100.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SumAggregate;

impl Aggregate for SumAggregate {
    fn identity(&self) -> StatValue {
        StatValue::zero()
    }

    fn fold(&self, acc: StatValue, contribution: StatValue) -> StatValue {
        acc + contribution
    }

    fn description(&self) -> String {
        "sum".to_string()
    }
}

/// Multiplicative aggregation: the stat value is the product of its
/// sources. A stat with no sources evaluates to 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductAggregate;

impl Aggregate for ProductAggregate {
    fn identity(&self) -> StatValue {
        StatValue::one()
    }

    fn fold(&self, acc: StatValue, contribution: StatValue) -> StatValue {
        acc * contribution
    }

    fn description(&self) -> String {
        "product".to_string()
    }
}

/// Maximum aggregation: the stat value is the largest source value,
/// floored at the configured identity.
///
/// # Examples
///
/// ```rust
/// use modgraph::{Aggregate, MaxAggregate};
///
/// let max = MaxAggregate::with_floor(0.0);
/// let acc = max.fold(max.identity(), 30.0);
/// let acc = max.fold(acc, 12.0);
/// assert_eq!(acc, 30.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MaxAggregate {
    floor: StatValue,
}

impl MaxAggregate {
    /// Create a max strategy with the given floor (also the value of a
    /// stat with no sources).
    pub fn with_floor(floor: StatValue) -> Self {
        Self { floor }
    }
}

impl Default for MaxAggregate {
    fn default() -> Self {
        Self::with_floor(StatValue::zero())
    }
}

impl Aggregate for MaxAggregate {
    fn identity(&self) -> StatValue {
        self.floor
    }

    fn fold(&self, acc: StatValue, contribution: StatValue) -> StatValue {
        if contribution > acc {
            contribution
        } else {
            acc
        }
    }

    fn description(&self) -> String {
        format!("max(floor {})", self.floor)
    }
}
