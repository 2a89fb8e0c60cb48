//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value into `[-1, 1]` so it can be safely passed to `acos` or `asin`.
///
/// Law of cosines ratios overshoot this range by a few ULP when the triangle is degenerate.
pub fn clamp_unit<T>(value: T) -> T
where
    T: Float
{
    value.max(-T::one()).min(T::one())
}
