//! Stat snapshot module.
//!
//! Contains the `StatSnapshot` type: a read-only, serializable view of
//! a stat at one point in time, with the per-source breakdown. The
//! graph itself never persists anything; an external encoder takes
//! snapshots and writes them wherever it likes.

use crate::key::Key;
use crate::numeric::StatValue;
use serde::{Deserialize, Serialize};

/// A point-in-time view of a stat with its source breakdown.
///
/// Detached from the graph: holds plain keys and values, no handles,
/// so it stays valid after the stat or its sources change or die.
///
/// # Examples
///
/// ```rust
/// use modgraph::{Key, StatSnapshot};
///
/// let mut snapshot = StatSnapshot::new(Key::new("HP"), 120.0);
/// snapshot.add_source(Key::new("base"), 100.0);
/// snapshot.add_source(Key::new("buff"), 20.0);
///
/// assert_eq!(snapshot.value, 120.0);
/// assert_eq!(snapshot.sources.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatSnapshot {
    /// The stat's caller-chosen key.
    pub key: Key,

    /// The aggregated value, valid at the time of the snapshot.
    pub value: StatValue,

    /// Per-source contributions, in ascending key order (the fold
    /// order used to compute `value`).
    pub sources: Vec<(Key, StatValue)>,
}

impl StatSnapshot {
    /// Create a snapshot with an empty source breakdown.
    pub fn new(key: Key, value: StatValue) -> Self {
        Self {
            key,
            value,
            sources: Vec::new(),
        }
    }

    /// Append one source contribution to the breakdown.
    pub fn add_source(&mut self, key: Key, value: StatValue) {
        self.sources.push((key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_creation() {
        let snapshot = StatSnapshot::new(Key::new("HP"), 120.0);
        assert_eq!(snapshot.key.as_str(), "HP");
        assert_eq!(snapshot.value, 120.0);
        assert!(snapshot.sources.is_empty());
    }

    #[test]
    fn test_snapshot_breakdown_order() {
        let mut snapshot = StatSnapshot::new(Key::new("HP"), 120.0);
        snapshot.add_source(Key::new("base"), 100.0);
        snapshot.add_source(Key::new("buff"), 20.0);

        assert_eq!(snapshot.sources[0].0.as_str(), "base");
        assert_eq!(snapshot.sources[1].0.as_str(), "buff");
    }
}
