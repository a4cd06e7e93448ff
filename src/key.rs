//! Caller-chosen object key module.
//!
//! Provides the `Key` type, an interned string identifier chosen by the
//! caller when a stat, effect, or modifier is created. Uses `Arc<str>`
//! for memory efficiency and cheap cloning; `Ord` so that sorted source
//! maps iterate in a deterministic order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Interned string identifier for graph objects.
///
/// A `Key` is chosen by the caller at construction time and is immutable
/// for the lifetime of the object. Keys do not have to be globally unique;
/// uniqueness is only enforced among the sources of a single stat.
///
/// # Examples
///
/// ```rust
/// use modgraph::Key;
///
/// let hp = Key::new("HP");
/// let buff = Key::new("buff.strength");
///
/// // Can be created from string slices or owned strings
/// let hp2: Key = "HP".into();
/// let hp3: Key = String::from("HP").into();
///
/// assert_eq!(hp, hp2);
/// assert_eq!(hp, hp3);
/// assert!(buff < hp2 || buff > hp2);
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Key(Arc<str>);

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Key::from(s))
    }
}

impl Key {
    /// Create a new `Key` from a string slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modgraph::Key;
    ///
    /// let key = Key::new("HP");
    /// assert_eq!(key.as_str(), "HP");
    /// ```
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the string representation of this `Key`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
