//! Numeric types for stat values.
//!
//! Stat math runs on [`StatValue`] (`f64`). The [`StatNumeric`] trait
//! collects the operations aggregation strategies rely on, so a
//! different numeric backend can be slotted in without touching the
//! graph code.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// The numeric type carried by modifiers and stat caches.
pub type StatValue = f64;

/// Trait for numeric operations required by stat aggregation.
pub trait StatNumeric:
    Clone
    + Copy
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Default
{
    /// Create a zero value.
    fn zero() -> Self;

    /// Create a one value.
    fn one() -> Self;

    /// Create a value from an integer.
    fn from_int(i: i64) -> Self;

    /// Create a value from f64.
    fn from_f64(f: f64) -> Self;

    /// Convert to f64.
    fn to_f64(self) -> f64;

    /// Clamp the value between min and max (inclusive).
    fn clamp_to(self, min: Self, max: Self) -> Self;
}

impl StatNumeric for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_int(i: i64) -> Self {
        i as f64
    }

    fn from_f64(f: f64) -> Self {
        f
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn clamp_to(self, min: Self, max: Self) -> Self {
        self.clamp(min, max)
    }
}
