//! Arithmetic shared by the calculation pipeline and the R script exporter.
//!
//! Every formula that appears in both surfaces lives here so the two cannot
//! drift apart. The R exporter renders these same definitions as R functions.

/// Weight between perfectly correlated access barriers (`min`) and
/// independent ones (`product`).
pub const ACCESS_CORRELATION: f64 = 0.5;

/// Probability that someone clears both the distance and affordability
/// barriers. Inputs are expected to be in `[0, 1]`.
pub fn combine_access(distance: f64, affordability: f64) -> f64 {
    ACCESS_CORRELATION * distance.min(affordability)
        + (1.0 - ACCESS_CORRELATION) * (distance * affordability)
}

/// Clamps into `[0, 1]`. NaN maps to `0.0`.
pub fn clamp01(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

/// Division that yields `0.0` instead of infinity or NaN on a zero
/// denominator.
pub fn divide_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Whole-unit share of a pool. The proportion is clamped into `[0, 1]` and
/// the `min` keeps rounding from ever granting more people than the pool
/// holds.
pub fn rounded_share(pool: f64, proportion: f64) -> f64 {
    (pool * clamp01(proportion)).round().min(pool)
}
